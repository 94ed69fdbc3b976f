//! Per-step survey completion and drop-off.
//!
//! Step ordering is never derived from the data: an injected canonical
//! question order (the questionnaire form definition) decides it, and steps
//! missing from that list sort after all known steps in encounter order.

use std::collections::{HashMap, HashSet};

use insights_core::{EventKind, EventRecord, UserRef};
use serde::{Deserialize, Serialize};

use crate::rate::Rate;
use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStepStat {
    pub id: String,
    /// Display label: 1-based position plus the title-cased step id,
    /// e.g. `"1. Work Values"`.
    pub label: String,
    pub started_count: u64,
    pub completed_count: u64,
    pub completion_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDropoff {
    /// Step after which the users were lost.
    pub id: String,
    pub label: String,
    pub started: u64,
    pub continued: u64,
    pub dropped: u64,
    pub dropoff_rate: Rate,
}

/// Per-step counts in canonical order. Shared by the step-completion and
/// drop-off extractors so both report over the identical step chain.
fn ordered_step_counts(events: &[EventRecord], order: &[String]) -> Vec<(String, u64, u64)> {
    let mut completers: HashMap<&str, HashSet<&UserRef>> = HashMap::new();
    let mut encountered: Vec<&str> = Vec::new();
    let mut starters: HashSet<&UserRef> = HashSet::new();

    for event in events {
        match &event.kind {
            EventKind::SurveyStepComplete { step_id } => {
                let set = completers.entry(step_id.as_str()).or_insert_with(|| {
                    encountered.push(step_id.as_str());
                    HashSet::new()
                });
                set.insert(&event.user_id);
            }
            EventKind::SurveyStart { .. } => {
                starters.insert(&event.user_id);
            }
            _ => {}
        }
    }

    let mut ids: Vec<&str> = encountered;
    ids.sort_by_key(|id| {
        order
            .iter()
            .position(|known| known == id)
            .unwrap_or(usize::MAX)
    });

    // Users reaching a step are those who completed the previous one; the
    // first step is reached by everyone who started the survey.
    let mut reached = starters.len() as u64;
    let mut counts = Vec::with_capacity(ids.len());
    for id in ids {
        let completed = completers.get(id).map_or(0, |set| set.len()) as u64;
        counts.push((id.to_string(), reached, completed));
        reached = completed;
    }
    counts
}

/// Title-case a snake_case step id: `work_values` -> `Work Values`.
fn step_title(id: &str) -> String {
    id.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct SurveyStepsExtractor {
    order: Vec<String>,
}

impl SurveyStepsExtractor {
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }
}

impl MetricExtractor for SurveyStepsExtractor {
    fn metric(&self) -> Metric {
        Metric::SurveySteps
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let steps = ordered_step_counts(events, &self.order)
            .into_iter()
            .enumerate()
            .map(|(position, (id, started, completed))| SurveyStepStat {
                label: format!("{}. {}", position + 1, step_title(&id)),
                id,
                started_count: started,
                completed_count: completed,
                completion_rate: Rate::of(completed, started),
            })
            .collect();
        MetricBlock::SurveySteps(steps)
    }
}

pub struct DropoffExtractor {
    order: Vec<String>,
}

impl DropoffExtractor {
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }
}

impl MetricExtractor for DropoffExtractor {
    fn metric(&self) -> Metric {
        Metric::DropoffAnalysis
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let counts = ordered_step_counts(events, &self.order);
        let mut dropoffs = Vec::new();
        for (position, window) in counts.windows(2).enumerate() {
            let (ref id, started, _) = window[0];
            let (_, continued, _) = window[1];
            let dropped = started.saturating_sub(continued);
            dropoffs.push(StepDropoff {
                id: id.clone(),
                label: format!("{}. {}", position + 1, step_title(id)),
                started,
                continued,
                dropped,
                dropoff_rate: Rate::of(dropped, started),
            });
        }
        MetricBlock::DropoffAnalysis(dropoffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use insights_core::SurveyType;

    fn canonical() -> Vec<String> {
        insights_core::EngineConfig::default().step_order
    }

    fn start(user: &str) -> EventRecord {
        EventRecord::new(
            EventKind::SurveyStart {
                survey_type: SurveyType::Text,
            },
            Utc::now(),
            user,
            false,
        )
    }

    fn step(user: &str, id: &str) -> EventRecord {
        EventRecord::new(
            EventKind::SurveyStepComplete {
                step_id: id.to_string(),
            },
            Utc::now(),
            user,
            false,
        )
    }

    fn extract_steps(events: &[EventRecord]) -> Vec<SurveyStepStat> {
        match SurveyStepsExtractor::new(canonical()).extract(events) {
            MetricBlock::SurveySteps(steps) => steps,
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_canonical_order_and_labels() {
        // self_growth sits at canonical index 7, work_values at index 0;
        // encounter order in the data is the reverse.
        let events = vec![
            start("u1"),
            step("u1", "self_growth"),
            step("u1", "work_values"),
        ];
        let steps = extract_steps(&events);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "work_values");
        assert_eq!(steps[0].label, "1. Work Values");
        assert_eq!(steps[1].id, "self_growth");
        assert_eq!(steps[1].label, "2. Self Growth");
    }

    #[test]
    fn test_unknown_steps_sort_after_known_in_encounter_order() {
        let events = vec![
            start("u1"),
            step("u1", "zz_custom_b"),
            step("u1", "zz_custom_a"),
            step("u1", "leadership"),
        ];
        let steps = extract_steps(&events);
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["leadership", "zz_custom_b", "zz_custom_a"]);
    }

    #[test]
    fn test_started_chains_through_completions() {
        let mut events = Vec::new();
        for i in 0..10 {
            events.push(start(&format!("u{i}")));
        }
        for i in 0..8 {
            events.push(step(&format!("u{i}"), "work_values"));
        }
        for i in 0..5 {
            events.push(step(&format!("u{i}"), "corporate_culture"));
        }

        let steps = extract_steps(&events);
        assert_eq!(steps[0].started_count, 10);
        assert_eq!(steps[0].completed_count, 8);
        assert_eq!(steps[0].completion_rate.display(), "80%");
        assert_eq!(steps[1].started_count, 8);
        assert_eq!(steps[1].completed_count, 5);
        assert_eq!(steps[1].completion_rate.display(), "63%");
    }

    #[test]
    fn test_dropoff_between_consecutive_steps() {
        let mut events = Vec::new();
        for i in 0..10 {
            events.push(start(&format!("u{i}")));
        }
        for i in 0..8 {
            events.push(step(&format!("u{i}"), "work_values"));
        }
        for i in 0..5 {
            events.push(step(&format!("u{i}"), "corporate_culture"));
        }

        let dropoffs = match DropoffExtractor::new(canonical()).extract(&events) {
            MetricBlock::DropoffAnalysis(d) => d,
            other => panic!("unexpected block: {other:?}"),
        };
        assert_eq!(dropoffs.len(), 1);
        assert_eq!(dropoffs[0].id, "work_values");
        assert_eq!(dropoffs[0].started, 10);
        assert_eq!(dropoffs[0].continued, 8);
        assert_eq!(dropoffs[0].dropped, 2);
        assert_eq!(dropoffs[0].dropoff_rate.display(), "20%");
    }

    #[test]
    fn test_zero_starts_yield_zero_rate() {
        let events = vec![step("u1", "work_values")];
        let steps = extract_steps(&events);
        assert_eq!(steps[0].started_count, 0);
        assert_eq!(steps[0].completed_count, 1);
        assert_eq!(steps[0].completion_rate.display(), "0%");
    }
}
