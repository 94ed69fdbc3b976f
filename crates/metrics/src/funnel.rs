//! Questionnaire funnel — unique users reaching visit, start, and completion.

use std::collections::HashSet;

use insights_core::{EventKind, EventRecord, UserRef};
use serde::{Deserialize, Serialize};

use crate::rate::Rate;
use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyFunnelStats {
    /// Raw page-visit events, kept alongside the unique count.
    pub visits: u64,
    pub unique_users: u64,
    pub started: u64,
    pub completed: u64,
    pub start_rate: Rate,
    pub completion_rate: Rate,
    pub overall_conversion_rate: Rate,
    pub anonymous_starts: u64,
    pub non_anonymous_starts: u64,
}

pub struct FunnelExtractor;

impl MetricExtractor for FunnelExtractor {
    fn metric(&self) -> Metric {
        Metric::SurveyFunnel
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let mut visits = 0u64;
        let mut visitors: HashSet<&UserRef> = HashSet::new();
        let mut starters: HashSet<&UserRef> = HashSet::new();
        let mut anonymous_starters: HashSet<&UserRef> = HashSet::new();
        let mut completers: HashSet<&UserRef> = HashSet::new();

        for event in events {
            match &event.kind {
                EventKind::PageVisit => {
                    visits += 1;
                    visitors.insert(&event.user_id);
                }
                EventKind::SurveyStart { .. } => {
                    starters.insert(&event.user_id);
                    if event.is_anonymous {
                        anonymous_starters.insert(&event.user_id);
                    }
                }
                EventKind::SurveyComplete => {
                    completers.insert(&event.user_id);
                }
                _ => {}
            }
        }

        let unique_users = visitors.len() as u64;
        let started = starters.len() as u64;
        let completed = completers.len() as u64;
        let anonymous_starts = anonymous_starters.len() as u64;

        MetricBlock::SurveyFunnel(SurveyFunnelStats {
            visits,
            unique_users,
            started,
            completed,
            start_rate: Rate::of(started, unique_users),
            completion_rate: Rate::of(completed, started),
            overall_conversion_rate: Rate::of(completed, unique_users),
            anonymous_starts,
            non_anonymous_starts: started - anonymous_starts,
        })
    }
}
