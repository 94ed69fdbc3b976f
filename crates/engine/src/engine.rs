//! Snapshot orchestration. One computation resolves the window, queries the
//! event store exactly once, and runs every selected extractor over the same
//! materialized event set, so all blocks in a snapshot describe the same
//! population.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use insights_cache::{RefreshGate, SnapshotCache};
use insights_core::{
    EngineConfig, EventKindFilter, EventRecord, EventStore, InsightsError, InsightsResult,
    TimeRange,
};
use insights_metrics::{
    all_extractors, BlockError, Metric, MetricExtractor, RefreshKey, Snapshot,
};
use tracing::{info, warn};

pub struct SnapshotEngine {
    store: Arc<dyn EventStore>,
    cache: Arc<SnapshotCache>,
    gate: RefreshGate,
    extractors: Vec<Arc<dyn MetricExtractor>>,
    adapter_timeout: Duration,
}

impl SnapshotEngine {
    pub fn new(store: Arc<dyn EventStore>, config: &EngineConfig) -> Self {
        Self::with_extractors(store, config, all_extractors(config.step_order.clone()))
    }

    /// Build an engine over a custom extractor set. `new` is this with the
    /// full set; callers substituting extractors own the block coverage.
    pub fn with_extractors(
        store: Arc<dyn EventStore>,
        config: &EngineConfig,
        extractors: Vec<Arc<dyn MetricExtractor>>,
    ) -> Self {
        Self {
            store,
            cache: Arc::new(SnapshotCache::new()),
            gate: RefreshGate::new(),
            extractors,
            adapter_timeout: Duration::from_millis(config.adapter_timeout_ms),
        }
    }

    pub fn cache(&self) -> Arc<SnapshotCache> {
        Arc::clone(&self.cache)
    }

    /// Full refresh: compute every block and replace the cached snapshot.
    pub async fn refresh_all(&self, range: TimeRange) -> InsightsResult<Snapshot> {
        let _permit = self.gate.acquire(RefreshKey::All)?;
        let ticket = self.cache.ticket();
        let snapshot = self.compute(range, &Metric::ALL, None).await?;
        self.apply_full(snapshot, ticket)
    }

    fn apply_full(&self, snapshot: Snapshot, ticket: u64) -> InsightsResult<Snapshot> {
        match self.cache.replace_all(snapshot.clone(), ticket) {
            Ok(()) => Ok(snapshot),
            Err(InsightsError::SupersededRefresh) => {
                // A newer request already wrote; our result is discarded.
                warn!(ticket, "full refresh superseded, result discarded");
                self.cache.get().ok_or(InsightsError::SupersededRefresh)
            }
            Err(err) => Err(err),
        }
    }

    /// Per-card refresh: recompute only the blocks behind `key` and merge
    /// them into the cached snapshot, leaving every other block untouched.
    /// Falls back to a full computation when nothing is cached yet.
    pub async fn refresh(&self, range: TimeRange, key: RefreshKey) -> InsightsResult<Snapshot> {
        if key == RefreshKey::All {
            return self.refresh_all(range).await;
        }

        let _permit = self.gate.acquire(key)?;

        if self.cache.get().is_none() {
            let ticket = self.cache.ticket();
            let snapshot = self.compute(range, &Metric::ALL, None).await?;
            return self.apply_full(snapshot, ticket);
        }

        let metrics = key.metrics();
        let kinds = query_kinds(metrics);
        let ticket = self.cache.ticket();
        let partial = self.compute(range.clone(), metrics, Some(&kinds)).await?;

        for metric in metrics {
            match self.cache.replace_block(&range, partial.block(*metric), ticket) {
                Ok(()) => {}
                Err(InsightsError::StaleWindow) => {
                    warn!(
                        metric = metric.as_str(),
                        "cached window changed mid-refresh, block discarded"
                    );
                    break;
                }
                Err(InsightsError::SupersededRefresh) => {
                    warn!(
                        metric = metric.as_str(),
                        "partial refresh superseded, block discarded"
                    );
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        self.cache.get().ok_or(InsightsError::StaleWindow)
    }

    async fn compute(
        &self,
        range: TimeRange,
        metrics: &[Metric],
        kinds: Option<&[EventKindFilter]>,
    ) -> InsightsResult<Snapshot> {
        let window = range.resolve(Utc::now())?;

        let query = self.store.query(window.start, window.end, kinds);
        let events = match tokio::time::timeout(self.adapter_timeout, query).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(InsightsError::AdapterTimeout {
                    timeout_ms: self.adapter_timeout.as_millis() as u64,
                })
            }
        };
        let events: Arc<[EventRecord]> = events.into();
        info!(
            window = %range.label(),
            events = events.len(),
            metrics = metrics.len(),
            "computing snapshot"
        );

        let mut snapshot = Snapshot::empty(range, Utc::now());
        snapshot.total_events = events.len() as u64;

        let mut handles = Vec::with_capacity(metrics.len());
        for extractor in &self.extractors {
            let metric = extractor.metric();
            if !metrics.contains(&metric) {
                continue;
            }
            let extractor = Arc::clone(extractor);
            let events = Arc::clone(&events);
            handles.push((
                metric,
                tokio::spawn(async move { extractor.extract(&events) }),
            ));
        }

        // One failing extractor must not sink the rest of the snapshot.
        for (metric, handle) in handles {
            match handle.await {
                Ok(block) => snapshot.set_block(block),
                Err(err) => {
                    warn!(metric = metric.as_str(), error = %err, "extractor failed");
                    snapshot.block_errors.push(BlockError {
                        metric,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(snapshot)
    }
}

/// Union of the event kinds the given metrics read.
fn query_kinds(metrics: &[Metric]) -> Vec<EventKindFilter> {
    let mut kinds = Vec::new();
    for metric in metrics {
        for kind in metric.event_kinds() {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
    }
    kinds
}
