//! Last computed snapshot, shared between refresh paths.
//!
//! Writers are mutually exclusive; block replacement swaps the whole block
//! value so a reader never observes a half-written block. Every write carries
//! the ticket its computation started with, and a write whose ticket is older
//! than the last applied one is rejected: the winner is the last request, not
//! the last completion.

use std::sync::atomic::{AtomicU64, Ordering};

use insights_core::{InsightsError, InsightsResult, TimeRange};
use insights_metrics::{MetricBlock, Snapshot};
use parking_lot::RwLock;
use tracing::debug;

struct CacheState {
    snapshot: Snapshot,
    applied_ticket: u64,
}

#[derive(Default)]
pub struct SnapshotCache {
    current: RwLock<Option<CacheState>>,
    next_ticket: AtomicU64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Reserve a request ticket. Take it before computing; pass it back when
    /// applying the result.
    pub fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Current snapshot, if any computation has completed yet.
    pub fn get(&self) -> Option<Snapshot> {
        self.current.read().as_ref().map(|state| state.snapshot.clone())
    }

    pub fn window(&self) -> Option<TimeRange> {
        self.current
            .read()
            .as_ref()
            .map(|state| state.snapshot.window.clone())
    }

    /// Replace the whole snapshot.
    pub fn replace_all(&self, snapshot: Snapshot, ticket: u64) -> InsightsResult<()> {
        let mut guard = self.current.write();
        if let Some(state) = guard.as_ref() {
            if ticket < state.applied_ticket {
                return Err(InsightsError::SupersededRefresh);
            }
        }
        debug!(ticket, window = %snapshot.window.label(), "snapshot replaced");
        *guard = Some(CacheState {
            snapshot,
            applied_ticket: ticket,
        });
        Ok(())
    }

    /// Replace one block of the cached snapshot, leaving the rest untouched.
    /// Fails without modifying the cache when the cached window no longer
    /// matches the window the block was computed for, or when a newer request
    /// already wrote.
    pub fn replace_block(
        &self,
        window: &TimeRange,
        block: MetricBlock,
        ticket: u64,
    ) -> InsightsResult<()> {
        let mut guard = self.current.write();
        let state = guard.as_mut().ok_or(InsightsError::StaleWindow)?;
        if state.snapshot.window != *window {
            return Err(InsightsError::StaleWindow);
        }
        if ticket < state.applied_ticket {
            return Err(InsightsError::SupersededRefresh);
        }
        debug!(ticket, metric = block.metric().as_str(), "block replaced");
        state.snapshot.set_block(block);
        state.applied_ticket = ticket;
        Ok(())
    }
}
