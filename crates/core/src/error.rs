use chrono::{DateTime, Utc};
use thiserror::Error;

pub type InsightsResult<T> = Result<T, InsightsError>;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Event store query exceeded {timeout_ms}ms")]
    AdapterTimeout { timeout_ms: u64 },

    #[error("Event store query failed: {0}")]
    AdapterQuery(String),

    #[error("Block was computed for a window that no longer matches the cache")]
    StaleWindow,

    #[error("Refresh result superseded by a newer request")]
    SupersededRefresh,

    #[error("A refresh for '{target}' is already in flight")]
    ConcurrentRefresh { target: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
