//! Signup dialog metrics — users abandoning registration by closing the
//! dialog. The conversion-impact rate keeps its numeric form alongside the
//! display string so the progress-bar consumer never re-parses it.

use std::collections::HashSet;

use insights_core::{EventKind, EventRecord, UserRef};
use serde::{Deserialize, Serialize};

use crate::rate::Rate;
use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogCloseStats {
    pub signup_clicks: u64,
    pub dialog_closes: u64,
    pub unique_dialog_closes: u64,
    /// Unique closers over unique visitors.
    pub dialog_close_conversion_rate: Rate,
}

pub struct DialogCloseExtractor;

impl MetricExtractor for DialogCloseExtractor {
    fn metric(&self) -> Metric {
        Metric::DialogCloses
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let mut signup_clicks = 0u64;
        let mut closes = 0u64;
        let mut closers: HashSet<&UserRef> = HashSet::new();
        let mut visitors: HashSet<&UserRef> = HashSet::new();

        for event in events {
            match &event.kind {
                EventKind::SignupClick => signup_clicks += 1,
                EventKind::DialogClose => {
                    closes += 1;
                    closers.insert(&event.user_id);
                }
                EventKind::PageVisit => {
                    visitors.insert(&event.user_id);
                }
                _ => {}
            }
        }

        let unique_closes = closers.len() as u64;
        MetricBlock::DialogCloses(DialogCloseStats {
            signup_clicks,
            dialog_closes: closes,
            unique_dialog_closes: unique_closes,
            dialog_close_conversion_rate: Rate::of(unique_closes, visitors.len() as u64),
        })
    }
}
