//! Event-store contract. The engine owns no storage; it queries an external
//! adapter by time range and, optionally, by event kind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::InsightsResult;
use crate::event::{EventKindFilter, EventRecord};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Return all events with `start <= timestamp <= end`, optionally
    /// restricted to the given kinds. Kind filtering is an optimization for
    /// partial refreshes; extractors filter the batch themselves regardless.
    async fn query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kinds: Option<&[EventKindFilter]>,
    ) -> InsightsResult<Vec<EventRecord>>;
}

/// In-memory event store. Backs the CLI's file adapter and the test suites.
pub struct MemoryStore {
    events: Vec<EventRecord>,
    latency: Option<std::time::Duration>,
}

impl MemoryStore {
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self {
            events,
            latency: None,
        }
    }

    /// Add a fixed delay before answering queries. Used to exercise the
    /// orchestrator's timeout and concurrent-refresh paths.
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kinds: Option<&[EventKindFilter]>,
    ) -> InsightsResult<Vec<EventRecord>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self
            .events
            .iter()
            .filter(|event| event.timestamp >= start && event.timestamp <= end)
            .filter(|event| kinds.map_or(true, |ks| ks.contains(&event.kind.filter())))
            .cloned()
            .collect())
    }
}
