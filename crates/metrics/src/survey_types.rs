//! Questionnaire type split — text-based vs image-based survey starts.

use insights_core::{EventKind, EventRecord, SurveyType};
use serde::{Deserialize, Serialize};

use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTypeStats {
    pub text: u64,
    pub image: u64,
    pub total: u64,
}

pub struct SurveyTypesExtractor;

impl MetricExtractor for SurveyTypesExtractor {
    fn metric(&self) -> Metric {
        Metric::SurveyTypes
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let mut stats = SurveyTypeStats::default();
        for event in events {
            if let EventKind::SurveyStart { survey_type } = &event.kind {
                match survey_type {
                    SurveyType::Text => stats.text += 1,
                    SurveyType::Image => stats.image += 1,
                }
                stats.total += 1;
            }
        }
        MetricBlock::SurveyTypes(stats)
    }
}
