#![warn(clippy::unwrap_used)]

pub mod gate;
pub mod snapshot_cache;

pub use gate::{RefreshGate, RefreshPermit};
pub use snapshot_cache::SnapshotCache;
