//! Survey Insights core — shared event model, time-window resolution,
//! configuration, and the event-store contract used by the aggregation engine.

pub mod config;
pub mod error;
pub mod event;
pub mod store;
pub mod window;

pub use config::EngineConfig;
pub use error::{InsightsError, InsightsResult};
pub use event::{EventKind, EventKindFilter, EventRecord, SignupMethod, SurveyType, UserRef};
pub use store::{EventStore, MemoryStore};
pub use window::{ResolvedWindow, TimeRange};
