//! Aggregation orchestrator — resolves the selected window, queries the
//! event store once per computation, fans the metric extractors out as
//! parallel tasks, and merges their blocks into the cached snapshot.

pub mod engine;

pub use engine::SnapshotEngine;
