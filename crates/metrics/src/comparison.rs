//! Anonymous-mode A/B comparison — partitions users into anonymous and
//! non-anonymous cohorts and compares their funnel behavior. A user's cohort
//! is taken from the identity flag on their first observed event; ids are
//! session- or account-scoped, so the flag is constant per id in practice.

use std::collections::{HashMap, HashSet};

use insights_core::{EventKind, EventRecord, UserRef};
use serde::{Deserialize, Serialize};

use crate::rate::Rate;
use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortStats {
    pub total: u64,
    /// Cohort share of all visitors.
    pub percentage: Rate,
    pub completion_rate: Rate,
    pub conversion_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDifference {
    pub completion_rate: Rate,
    pub conversion_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbComparisonStats {
    pub anonymous: CohortStats,
    pub non_anonymous: CohortStats,
    /// Signed: non-anonymous rate minus anonymous rate.
    pub difference: RateDifference,
}

/// Cohort funnel counts over one event window.
#[derive(Default)]
struct CohortCounts {
    visitors: u64,
    starters: u64,
    completers: u64,
}

fn split_cohorts(events: &[EventRecord]) -> (CohortCounts, CohortCounts, u64) {
    // First observed flag wins; session ids and account ids do not mix.
    let mut cohort_of: HashMap<&UserRef, bool> = HashMap::new();
    for event in events {
        cohort_of.entry(&event.user_id).or_insert(event.is_anonymous);
    }

    let mut visitors: HashSet<&UserRef> = HashSet::new();
    let mut starters: HashSet<&UserRef> = HashSet::new();
    let mut completers: HashSet<&UserRef> = HashSet::new();
    for event in events {
        match &event.kind {
            EventKind::PageVisit => {
                visitors.insert(&event.user_id);
            }
            EventKind::SurveyStart { .. } => {
                starters.insert(&event.user_id);
            }
            EventKind::SurveyComplete => {
                completers.insert(&event.user_id);
            }
            _ => {}
        }
    }

    let mut anonymous = CohortCounts::default();
    let mut identified = CohortCounts::default();
    for (user, is_anonymous) in &cohort_of {
        let counts = if *is_anonymous {
            &mut anonymous
        } else {
            &mut identified
        };
        if visitors.contains(user) {
            counts.visitors += 1;
        }
        if starters.contains(user) {
            counts.starters += 1;
        }
        if completers.contains(user) {
            counts.completers += 1;
        }
    }

    let total_visitors = visitors.len() as u64;
    (anonymous, identified, total_visitors)
}

fn cohort_stats(counts: &CohortCounts, total_visitors: u64) -> CohortStats {
    CohortStats {
        total: counts.visitors,
        percentage: Rate::of(counts.visitors, total_visitors),
        completion_rate: Rate::of(counts.completers, counts.starters),
        conversion_rate: Rate::of(counts.completers, counts.visitors),
    }
}

pub struct AbComparisonExtractor;

impl MetricExtractor for AbComparisonExtractor {
    fn metric(&self) -> Metric {
        Metric::AbTestComparison
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let (anonymous_counts, identified_counts, total_visitors) = split_cohorts(events);
        let anonymous = cohort_stats(&anonymous_counts, total_visitors);
        let non_anonymous = cohort_stats(&identified_counts, total_visitors);
        let difference = RateDifference {
            completion_rate: Rate::difference(
                non_anonymous.completion_rate,
                anonymous.completion_rate,
            ),
            conversion_rate: Rate::difference(
                non_anonymous.conversion_rate,
                anonymous.conversion_rate,
            ),
        };
        MetricBlock::AbTestComparison(AbComparisonStats {
            anonymous,
            non_anonymous,
            difference,
        })
    }
}

/// The dashboard's standalone "anonymous users" card: the anonymous cohort
/// of the same partition.
pub struct AnonymousUsersExtractor;

impl MetricExtractor for AnonymousUsersExtractor {
    fn metric(&self) -> Metric {
        Metric::AnonymousUsers
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let (anonymous_counts, _, total_visitors) = split_cohorts(events);
        MetricBlock::AnonymousUsers(cohort_stats(&anonymous_counts, total_visitors))
    }
}
