//! Snapshot assembly — the named metric blocks one computation produces,
//! plus the extractor contract and the dashboard's refresh-key mapping.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use insights_core::{EventKindFilter, EventRecord, TimeRange};
use serde::{Deserialize, Serialize};

use crate::comparison::{AbComparisonExtractor, AbComparisonStats, AnonymousUsersExtractor, CohortStats};
use crate::dialog::{DialogCloseExtractor, DialogCloseStats};
use crate::funnel::{FunnelExtractor, SurveyFunnelStats};
use crate::recommendations::{RecommendationStats, RecommendationsExtractor};
use crate::signups::{SignupStats, SignupsExtractor};
use crate::steps::{DropoffExtractor, StepDropoff, SurveyStepStat, SurveyStepsExtractor};
use crate::survey_types::{SurveyTypeStats, SurveyTypesExtractor};

/// Names of the snapshot's statistics blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    SurveyFunnel,
    SurveyTypes,
    Signups,
    Recommendations,
    SurveySteps,
    DropoffAnalysis,
    AnonymousUsers,
    AbTestComparison,
    DialogCloses,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::SurveyFunnel,
        Metric::SurveyTypes,
        Metric::Signups,
        Metric::Recommendations,
        Metric::SurveySteps,
        Metric::DropoffAnalysis,
        Metric::AnonymousUsers,
        Metric::AbTestComparison,
        Metric::DialogCloses,
    ];

    /// Event kinds this block reads. Lets a partial refresh ask the store
    /// for a narrower query; extractors still filter the batch themselves.
    pub fn event_kinds(&self) -> &'static [EventKindFilter] {
        match self {
            Metric::SurveyFunnel => &[
                EventKindFilter::PageVisit,
                EventKindFilter::SurveyStart,
                EventKindFilter::SurveyComplete,
            ],
            Metric::SurveyTypes => &[EventKindFilter::SurveyStart],
            Metric::Signups => &[EventKindFilter::Signup],
            Metric::Recommendations => &[
                EventKindFilter::RecommendationsPageVisit,
                EventKindFilter::RecommendationInterestClick,
            ],
            Metric::SurveySteps | Metric::DropoffAnalysis => &[
                EventKindFilter::SurveyStart,
                EventKindFilter::SurveyStepComplete,
            ],
            Metric::AnonymousUsers | Metric::AbTestComparison => &[
                EventKindFilter::PageVisit,
                EventKindFilter::SurveyStart,
                EventKindFilter::SurveyComplete,
            ],
            Metric::DialogCloses => &[
                EventKindFilter::PageVisit,
                EventKindFilter::SignupClick,
                EventKindFilter::DialogClose,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SurveyFunnel => "surveyFunnel",
            Metric::SurveyTypes => "surveyTypes",
            Metric::Signups => "signups",
            Metric::Recommendations => "recommendations",
            Metric::SurveySteps => "surveySteps",
            Metric::DropoffAnalysis => "dropoffAnalysis",
            Metric::AnonymousUsers => "anonymousUsers",
            Metric::AbTestComparison => "abTestComparison",
            Metric::DialogCloses => "dialogCloses",
        }
    }
}

/// Refresh keys exposed to the dashboard: one per card, plus the wildcard.
/// Several cards share a backing block, so a key may map to fewer metrics
/// than the card count suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshKey {
    Visitors,
    SurveyStarted,
    SurveyCompleted,
    Signups,
    SurveyFunnel,
    SurveyTypes,
    SignupMethods,
    UniqueSignups,
    Recommendations,
    SurveySteps,
    DropoffAnalysis,
    AnonymousUsers,
    AbTestComparison,
    DialogCloses,
    All,
}

impl RefreshKey {
    /// The metric blocks recomputed for this key.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            RefreshKey::Visitors
            | RefreshKey::SurveyStarted
            | RefreshKey::SurveyCompleted
            | RefreshKey::SurveyFunnel => &[Metric::SurveyFunnel],
            RefreshKey::Signups | RefreshKey::SignupMethods | RefreshKey::UniqueSignups => {
                &[Metric::Signups]
            }
            RefreshKey::SurveyTypes => &[Metric::SurveyTypes],
            RefreshKey::Recommendations => &[Metric::Recommendations],
            RefreshKey::SurveySteps => &[Metric::SurveySteps],
            RefreshKey::DropoffAnalysis => &[Metric::DropoffAnalysis],
            RefreshKey::AnonymousUsers => &[Metric::AnonymousUsers],
            RefreshKey::AbTestComparison => &[Metric::AbTestComparison],
            RefreshKey::DialogCloses => &[Metric::DialogCloses],
            RefreshKey::All => &Metric::ALL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshKey::Visitors => "visitors",
            RefreshKey::SurveyStarted => "surveyStarted",
            RefreshKey::SurveyCompleted => "surveyCompleted",
            RefreshKey::Signups => "signups",
            RefreshKey::SurveyFunnel => "surveyFunnel",
            RefreshKey::SurveyTypes => "surveyTypes",
            RefreshKey::SignupMethods => "signupMethods",
            RefreshKey::UniqueSignups => "uniqueSignups",
            RefreshKey::Recommendations => "recommendations",
            RefreshKey::SurveySteps => "surveySteps",
            RefreshKey::DropoffAnalysis => "dropoffAnalysis",
            RefreshKey::AnonymousUsers => "anonymousUsers",
            RefreshKey::AbTestComparison => "abTestComparison",
            RefreshKey::DialogCloses => "dialogCloses",
            RefreshKey::All => "all",
        }
    }
}

/// One extractor's output, tagged with its block name.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricBlock {
    SurveyFunnel(SurveyFunnelStats),
    SurveyTypes(SurveyTypeStats),
    Signups(SignupStats),
    Recommendations(RecommendationStats),
    SurveySteps(Vec<SurveyStepStat>),
    DropoffAnalysis(Vec<StepDropoff>),
    AnonymousUsers(CohortStats),
    AbTestComparison(AbComparisonStats),
    DialogCloses(DialogCloseStats),
}

impl MetricBlock {
    pub fn metric(&self) -> Metric {
        match self {
            MetricBlock::SurveyFunnel(_) => Metric::SurveyFunnel,
            MetricBlock::SurveyTypes(_) => Metric::SurveyTypes,
            MetricBlock::Signups(_) => Metric::Signups,
            MetricBlock::Recommendations(_) => Metric::Recommendations,
            MetricBlock::SurveySteps(_) => Metric::SurveySteps,
            MetricBlock::DropoffAnalysis(_) => Metric::DropoffAnalysis,
            MetricBlock::AnonymousUsers(_) => Metric::AnonymousUsers,
            MetricBlock::AbTestComparison(_) => Metric::AbTestComparison,
            MetricBlock::DialogCloses(_) => Metric::DialogCloses,
        }
    }
}

/// A pure per-domain aggregator over one materialized event window.
pub trait MetricExtractor: Send + Sync {
    fn metric(&self) -> Metric;
    fn extract(&self, events: &[EventRecord]) -> MetricBlock;
}

/// Failure of a single block within an otherwise successful computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockError {
    pub metric: Metric,
    pub message: String,
}

/// Point-in-time view of every derived statistic for one window. All blocks
/// were computed against the same materialized event set; the cache may
/// replace individual blocks, swapping whole block values at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub window: TimeRange,
    pub generated_at: DateTime<Utc>,
    pub total_events: u64,
    pub survey_funnel: SurveyFunnelStats,
    pub survey_types: SurveyTypeStats,
    pub signups: SignupStats,
    pub recommendations: RecommendationStats,
    pub survey_steps: Vec<SurveyStepStat>,
    pub dropoff_analysis: Vec<StepDropoff>,
    pub anonymous_users: CohortStats,
    pub ab_test_comparison: AbComparisonStats,
    pub dialog_closes: DialogCloseStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_errors: Vec<BlockError>,
}

impl Snapshot {
    /// The zero-valued snapshot shape, used before any data loads and as the
    /// base a computation fills in.
    pub fn empty(window: TimeRange, generated_at: DateTime<Utc>) -> Self {
        Self {
            window,
            generated_at,
            total_events: 0,
            survey_funnel: SurveyFunnelStats::default(),
            survey_types: SurveyTypeStats::default(),
            signups: SignupStats::default(),
            recommendations: RecommendationStats::default(),
            survey_steps: Vec::new(),
            dropoff_analysis: Vec::new(),
            anonymous_users: CohortStats::default(),
            ab_test_comparison: AbComparisonStats::default(),
            dialog_closes: DialogCloseStats::default(),
            block_errors: Vec::new(),
        }
    }

    /// Swap one block value in place.
    pub fn set_block(&mut self, block: MetricBlock) {
        match block {
            MetricBlock::SurveyFunnel(stats) => self.survey_funnel = stats,
            MetricBlock::SurveyTypes(stats) => self.survey_types = stats,
            MetricBlock::Signups(stats) => self.signups = stats,
            MetricBlock::Recommendations(stats) => self.recommendations = stats,
            MetricBlock::SurveySteps(steps) => self.survey_steps = steps,
            MetricBlock::DropoffAnalysis(dropoffs) => self.dropoff_analysis = dropoffs,
            MetricBlock::AnonymousUsers(stats) => self.anonymous_users = stats,
            MetricBlock::AbTestComparison(stats) => self.ab_test_comparison = stats,
            MetricBlock::DialogCloses(stats) => self.dialog_closes = stats,
        }
    }

    /// Copy one block out by name.
    pub fn block(&self, metric: Metric) -> MetricBlock {
        match metric {
            Metric::SurveyFunnel => MetricBlock::SurveyFunnel(self.survey_funnel.clone()),
            Metric::SurveyTypes => MetricBlock::SurveyTypes(self.survey_types.clone()),
            Metric::Signups => MetricBlock::Signups(self.signups.clone()),
            Metric::Recommendations => {
                MetricBlock::Recommendations(self.recommendations.clone())
            }
            Metric::SurveySteps => MetricBlock::SurveySteps(self.survey_steps.clone()),
            Metric::DropoffAnalysis => {
                MetricBlock::DropoffAnalysis(self.dropoff_analysis.clone())
            }
            Metric::AnonymousUsers => MetricBlock::AnonymousUsers(self.anonymous_users.clone()),
            Metric::AbTestComparison => {
                MetricBlock::AbTestComparison(self.ab_test_comparison.clone())
            }
            Metric::DialogCloses => MetricBlock::DialogCloses(self.dialog_closes.clone()),
        }
    }
}

/// The full extractor set, one per block, with the canonical step order
/// injected where ordering matters.
pub fn all_extractors(step_order: Vec<String>) -> Vec<Arc<dyn MetricExtractor>> {
    vec![
        Arc::new(FunnelExtractor),
        Arc::new(SurveyTypesExtractor),
        Arc::new(SignupsExtractor),
        Arc::new(RecommendationsExtractor),
        Arc::new(SurveyStepsExtractor::new(step_order.clone())),
        Arc::new(DropoffExtractor::new(step_order)),
        Arc::new(AnonymousUsersExtractor),
        Arc::new(AbComparisonExtractor),
        Arc::new(DialogCloseExtractor),
    ]
}
