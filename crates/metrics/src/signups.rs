//! Signup counts by method, uniqueness, and identity class.
//!
//! Uniqueness scope: deduplication is per method, and the combined unique
//! count is the sum of the per-method uniques, so `total == email + google`
//! holds on every axis. The anonymous/non-anonymous split partitions raw
//! events by the triggering user's identity flag, keeping
//! `anonymous + nonAnonymous == total` exact for any event set.

use std::collections::HashSet;

use insights_core::{EventKind, EventRecord, SignupMethod, UserRef};
use serde::{Deserialize, Serialize};

use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupStats {
    pub email_signups: u64,
    pub google_signups: u64,
    pub total_signups: u64,
    pub unique_email_signups: u64,
    pub unique_google_signups: u64,
    pub unique_total_signups: u64,
    pub anonymous_email_signups: u64,
    pub non_anonymous_email_signups: u64,
    pub anonymous_google_signups: u64,
    pub non_anonymous_google_signups: u64,
    pub anonymous_total_signups: u64,
    pub non_anonymous_total_signups: u64,
}

pub struct SignupsExtractor;

impl MetricExtractor for SignupsExtractor {
    fn metric(&self) -> Metric {
        Metric::Signups
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let mut stats = SignupStats::default();
        let mut email_users: HashSet<&UserRef> = HashSet::new();
        let mut google_users: HashSet<&UserRef> = HashSet::new();

        for event in events {
            if let EventKind::Signup { method } = &event.kind {
                match method {
                    SignupMethod::Email => {
                        stats.email_signups += 1;
                        email_users.insert(&event.user_id);
                        if event.is_anonymous {
                            stats.anonymous_email_signups += 1;
                        } else {
                            stats.non_anonymous_email_signups += 1;
                        }
                    }
                    SignupMethod::Google => {
                        stats.google_signups += 1;
                        google_users.insert(&event.user_id);
                        if event.is_anonymous {
                            stats.anonymous_google_signups += 1;
                        } else {
                            stats.non_anonymous_google_signups += 1;
                        }
                    }
                }
            }
        }

        stats.total_signups = stats.email_signups + stats.google_signups;
        stats.unique_email_signups = email_users.len() as u64;
        stats.unique_google_signups = google_users.len() as u64;
        stats.unique_total_signups = stats.unique_email_signups + stats.unique_google_signups;
        stats.anonymous_total_signups =
            stats.anonymous_email_signups + stats.anonymous_google_signups;
        stats.non_anonymous_total_signups =
            stats.non_anonymous_email_signups + stats.non_anonymous_google_signups;

        MetricBlock::Signups(stats)
    }
}
