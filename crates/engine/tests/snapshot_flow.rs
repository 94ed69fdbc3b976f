//! End-to-end orchestration tests over an in-memory event store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use insights_core::{
    EngineConfig, EventKind, EventRecord, InsightsError, MemoryStore, SignupMethod, SurveyType,
    TimeRange,
};
use insights_engine::SnapshotEngine;
use insights_metrics::{
    all_extractors, Metric, MetricBlock, MetricExtractor, RefreshKey, Snapshot, SurveyTypeStats,
};

fn at_hours(h: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(h)
}

/// The reference population: 100 distinct visitors, 40 unique survey starts
/// (10 anonymous), 25 completions, plus signups, steps, recommendations,
/// and dialog activity.
fn sample_events() -> Vec<EventRecord> {
    let mut events = Vec::new();
    for i in 0..100 {
        events.push(EventRecord::new(
            EventKind::PageVisit,
            at_hours(1),
            format!("u{i}"),
            i < 10,
        ));
    }
    for i in 0..40 {
        events.push(EventRecord::new(
            EventKind::SurveyStart {
                survey_type: if i % 2 == 0 {
                    SurveyType::Text
                } else {
                    SurveyType::Image
                },
            },
            at_hours(2),
            format!("u{i}"),
            i < 10,
        ));
    }
    for i in 0..30 {
        events.push(EventRecord::new(
            EventKind::SurveyStepComplete {
                step_id: "work_values".to_string(),
            },
            at_hours(3),
            format!("u{i}"),
            i < 10,
        ));
    }
    for i in 0..25 {
        events.push(EventRecord::new(
            EventKind::SurveyComplete,
            at_hours(4),
            format!("u{i}"),
            i < 10,
        ));
    }
    for i in 0..8 {
        events.push(EventRecord::new(
            EventKind::Signup {
                method: if i % 2 == 0 {
                    SignupMethod::Email
                } else {
                    SignupMethod::Google
                },
            },
            at_hours(5),
            format!("u{i}"),
            false,
        ));
    }
    for i in 0..12 {
        events.push(EventRecord::new(
            EventKind::RecommendationsPageVisit,
            at_hours(6),
            format!("u{i}"),
            false,
        ));
    }
    for i in 0..3 {
        events.push(EventRecord::new(
            EventKind::RecommendationInterestClick,
            at_hours(6),
            format!("u{i}"),
            false,
        ));
    }
    for i in 0..5 {
        events.push(EventRecord::new(
            EventKind::DialogClose,
            at_hours(7),
            format!("u{i}"),
            false,
        ));
    }
    events
}

fn window() -> TimeRange {
    TimeRange::Custom {
        start: at_hours(0),
        end: at_hours(24),
    }
}

fn engine_over(events: Vec<EventRecord>) -> SnapshotEngine {
    SnapshotEngine::new(
        Arc::new(MemoryStore::new(events)),
        &EngineConfig::default(),
    )
}

#[tokio::test]
async fn test_full_refresh_computes_all_blocks() {
    let engine = engine_over(sample_events());
    let snapshot = engine.refresh_all(window()).await.unwrap();

    assert_eq!(snapshot.survey_funnel.unique_users, 100);
    assert_eq!(snapshot.survey_funnel.started, 40);
    assert_eq!(snapshot.survey_funnel.completed, 25);
    assert_eq!(snapshot.survey_funnel.start_rate.display(), "40%");
    assert_eq!(snapshot.survey_funnel.completion_rate.display(), "63%");
    assert_eq!(snapshot.survey_funnel.overall_conversion_rate.display(), "25%");
    assert_eq!(snapshot.survey_funnel.anonymous_starts, 10);
    assert_eq!(snapshot.survey_funnel.non_anonymous_starts, 30);

    assert_eq!(snapshot.survey_types.total, 40);
    assert_eq!(
        snapshot.signups.total_signups,
        snapshot.signups.email_signups + snapshot.signups.google_signups
    );
    assert_eq!(
        snapshot.signups.total_signups,
        snapshot.signups.anonymous_total_signups + snapshot.signups.non_anonymous_total_signups
    );

    assert_eq!(snapshot.survey_steps.len(), 1);
    assert_eq!(snapshot.survey_steps[0].label, "1. Work Values");
    assert_eq!(snapshot.survey_steps[0].started_count, 40);
    assert_eq!(snapshot.survey_steps[0].completed_count, 30);

    assert_eq!(snapshot.recommendations.page_visits, 12);
    assert_eq!(snapshot.recommendations.unique_company_interests, 3);
    assert_eq!(snapshot.recommendations.company_interest_rate.display(), "25%");

    assert_eq!(snapshot.dialog_closes.unique_dialog_closes, 5);
    assert_eq!(snapshot.dialog_closes.dialog_close_conversion_rate.display(), "5%");

    assert!(snapshot.block_errors.is_empty());
    assert_eq!(engine.cache().get().unwrap(), snapshot);
}

#[tokio::test]
async fn test_blocks_share_one_population() {
    let engine = engine_over(sample_events());
    let snapshot = engine.refresh_all(window()).await.unwrap();

    // The A/B cohorts partition the funnel's unique visitors exactly.
    assert_eq!(
        snapshot.ab_test_comparison.anonymous.total
            + snapshot.ab_test_comparison.non_anonymous.total,
        snapshot.survey_funnel.unique_users
    );
    assert_eq!(
        snapshot.anonymous_users,
        snapshot.ab_test_comparison.anonymous
    );
}

#[tokio::test]
async fn test_partial_refresh_leaves_other_blocks_untouched() {
    let engine = engine_over(sample_events());
    let full = engine.refresh_all(window()).await.unwrap();

    let merged = engine.refresh(window(), RefreshKey::SurveySteps).await.unwrap();

    // Same data, same window: the merged snapshot matches the full one
    // block for block, and the untouched blocks are bit-identical.
    assert_eq!(merged.survey_steps, full.survey_steps);
    assert_eq!(merged.survey_funnel, full.survey_funnel);
    assert_eq!(merged.signups, full.signups);
    assert_eq!(merged.generated_at, full.generated_at);
}

#[tokio::test]
async fn test_partial_refresh_against_changed_window_is_discarded() {
    let engine = engine_over(sample_events());
    let full = engine.refresh_all(window()).await.unwrap();

    // The dashboard switched to a different window between the card's
    // request and its completion; the stale block must not be applied.
    let other = TimeRange::Custom {
        start: at_hours(0),
        end: at_hours(2),
    };
    let result = engine.refresh(other, RefreshKey::Signups).await.unwrap();
    assert_eq!(result, full);
}

#[tokio::test]
async fn test_partial_refresh_without_cache_falls_back_to_full() {
    let engine = engine_over(sample_events());
    let snapshot = engine
        .refresh(window(), RefreshKey::Recommendations)
        .await
        .unwrap();
    // Every block is populated, not just the requested one.
    assert_eq!(snapshot.survey_funnel.unique_users, 100);
    assert_eq!(snapshot.recommendations.page_visits, 12);
    assert!(engine.cache().get().is_some());
}

#[tokio::test]
async fn test_invalid_custom_range_is_rejected_before_querying() {
    let engine = engine_over(sample_events());
    let inverted = TimeRange::Custom {
        start: at_hours(10),
        end: at_hours(1),
    };
    let result = engine.refresh_all(inverted).await;
    assert!(matches!(result, Err(InsightsError::InvalidRange { .. })));
    assert!(engine.cache().get().is_none());
}

#[tokio::test]
async fn test_slow_adapter_surfaces_timeout() {
    let store = MemoryStore::new(sample_events()).with_latency(Duration::from_millis(200));
    let config = EngineConfig {
        adapter_timeout_ms: 20,
        ..EngineConfig::default()
    };
    let engine = SnapshotEngine::new(Arc::new(store), &config);

    let result = engine.refresh_all(window()).await;
    assert!(matches!(
        result,
        Err(InsightsError::AdapterTimeout { timeout_ms: 20 })
    ));
    assert!(engine.cache().get().is_none());
}

#[tokio::test]
async fn test_concurrent_refreshes_for_one_target_do_not_interleave() {
    let store = MemoryStore::new(sample_events()).with_latency(Duration::from_millis(50));
    let engine = SnapshotEngine::new(Arc::new(store), &EngineConfig::default());
    engine.refresh_all(window()).await.unwrap();

    let (first, second) = tokio::join!(
        engine.refresh(window(), RefreshKey::SurveySteps),
        engine.refresh(window(), RefreshKey::SurveySteps),
    );

    // Exactly one request holds the in-flight token; the duplicate is
    // rejected, never silently run twice.
    let rejections = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Err(InsightsError::ConcurrentRefresh { .. })))
        .count();
    assert_eq!(rejections, 1);

    let winner = if first.is_ok() { first } else { second };
    let cached = engine.cache().get().unwrap();
    assert_eq!(cached.survey_steps, winner.unwrap().survey_steps);
    assert_eq!(cached.survey_steps[0].started_count, 40);
}

/// Extractor that always fails, standing in for a broken aggregation.
struct BrokenTypesExtractor;

impl MetricExtractor for BrokenTypesExtractor {
    fn metric(&self) -> Metric {
        Metric::SurveyTypes
    }

    fn extract(&self, _events: &[EventRecord]) -> MetricBlock {
        panic!("survey type counts unavailable");
    }
}

#[tokio::test]
async fn test_one_failing_extractor_does_not_sink_the_snapshot() {
    let mut extractors = all_extractors(EngineConfig::default().step_order);
    extractors.retain(|e| e.metric() != Metric::SurveyTypes);
    extractors.push(Arc::new(BrokenTypesExtractor));

    let engine = SnapshotEngine::with_extractors(
        Arc::new(MemoryStore::new(sample_events())),
        &EngineConfig::default(),
        extractors,
    );
    let snapshot = engine.refresh_all(window()).await.unwrap();

    // The failed block stays at its zero value and is reported once; every
    // other block is computed normally.
    assert_eq!(snapshot.block_errors.len(), 1);
    assert_eq!(snapshot.block_errors[0].metric, Metric::SurveyTypes);
    assert_eq!(snapshot.survey_types, SurveyTypeStats::default());
    assert_eq!(snapshot.survey_funnel.unique_users, 100);
    assert_eq!(snapshot.signups.total_signups, 8);
    assert_eq!(engine.cache().get().unwrap(), snapshot);
}

#[tokio::test]
async fn test_superseded_fallback_returns_newer_snapshot() {
    // Empty cache, so the partial refresh falls back to a full computation;
    // a newer write lands while it is still querying.
    let store = MemoryStore::new(sample_events()).with_latency(Duration::from_millis(100));
    let engine = SnapshotEngine::new(Arc::new(store), &EngineConfig::default());
    let cache = engine.cache();

    let mut newer = Snapshot::empty(window(), at_hours(23));
    newer.total_events = 999;
    let newer_clone = newer.clone();

    let (result, ()) = tokio::join!(engine.refresh(window(), RefreshKey::Signups), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let ticket = cache.ticket();
        cache.replace_all(newer_clone, ticket).unwrap();
    });

    // The stale result is discarded in favor of what the newer write put in
    // the cache, same as a superseded full refresh.
    let snapshot = result.unwrap();
    assert_eq!(snapshot, newer);
    assert_eq!(cache.get().unwrap().total_events, 999);
}

#[tokio::test]
async fn test_rates_stay_within_percentage_bounds() {
    let engine = engine_over(sample_events());
    let snapshot = engine.refresh_all(window()).await.unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();

    fn check(value: &serde_json::Value, path: &str, signed_ok: bool) {
        match value {
            serde_json::Value::String(s) if s.ends_with('%') => {
                let pct: f64 = s.trim_end_matches('%').parse().unwrap();
                if signed_ok {
                    assert!((-100.0..=100.0).contains(&pct), "{path} = {s}");
                } else {
                    assert!((0.0..=100.0).contains(&pct), "{path} out of range: {s}");
                }
            }
            serde_json::Value::Object(map) => {
                for (key, nested) in map {
                    // Only the A/B difference block may carry signed rates.
                    check(nested, &format!("{path}.{key}"), signed_ok || key == "difference");
                }
            }
            serde_json::Value::Array(items) => {
                for (i, nested) in items.iter().enumerate() {
                    check(nested, &format!("{path}[{i}]"), signed_ok);
                }
            }
            _ => {}
        }
    }
    check(&json, "snapshot", false);
}
