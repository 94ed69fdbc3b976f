//! Time-window resolution — maps a dashboard range selector onto concrete
//! instants. Events are compared against absolute instants only; the fixed
//! UTC+9 display offset never affects which events fall inside a window.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InsightsError, InsightsResult};

/// Display offset for the dashboard (JST). Formatting only.
pub const DISPLAY_OFFSET_SECS: i32 = 9 * 3600;

/// Range selector as picked in the dashboard. `Custom` bounds are inclusive
/// instants; a cached snapshot is keyed by this selector value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "all")]
    AllTime,
    #[serde(rename = "custom")]
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Concrete inclusive window a computation ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Resolve the selector against `now`. Presets anchor their end at `now`;
    /// a custom range passes through after validating `start <= end`.
    pub fn resolve(&self, now: DateTime<Utc>) -> InsightsResult<ResolvedWindow> {
        let window = match self {
            TimeRange::Last24Hours => ResolvedWindow {
                start: now - Duration::hours(24),
                end: now,
            },
            TimeRange::Last7Days => ResolvedWindow {
                start: now - Duration::days(7),
                end: now,
            },
            TimeRange::Last30Days => ResolvedWindow {
                start: now - Duration::days(30),
                end: now,
            },
            TimeRange::AllTime => ResolvedWindow {
                start: DateTime::<Utc>::UNIX_EPOCH,
                end: now,
            },
            TimeRange::Custom { start, end } => {
                if start > end {
                    return Err(InsightsError::InvalidRange {
                        start: *start,
                        end: *end,
                    });
                }
                ResolvedWindow {
                    start: *start,
                    end: *end,
                }
            }
        };
        Ok(window)
    }

    /// Human-readable label, with custom bounds rendered in the display offset.
    pub fn label(&self) -> String {
        match self {
            TimeRange::Last24Hours => "Last 24 Hours".to_string(),
            TimeRange::Last7Days => "Last 7 Days".to_string(),
            TimeRange::Last30Days => "Last 30 Days".to_string(),
            TimeRange::AllTime => "All Time".to_string(),
            TimeRange::Custom { start, end } => {
                format!("{} - {}", format_display(*start), format_display(*end))
            }
        }
    }
}

impl ResolvedWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Format an instant for display in the fixed dashboard offset (UTC+9).
pub fn format_display(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&display_offset())
        .format("%b %-d, %Y")
        .to_string()
}

fn display_offset() -> FixedOffset {
    // 9 hours east is always within chrono's valid offset range.
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).expect("fixed display offset")
}
