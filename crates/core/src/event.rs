//! Raw analytics event model shared by the event store and the extractors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identity. Anonymous users carry a session-scoped id and
/// identified users an account-scoped id; uniqueness within a metric is
/// always counted over this value, never over raw event tallies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRef(String);

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyType {
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupMethod {
    Email,
    Google,
}

/// One tracked user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    PageVisit,
    RecommendationsPageVisit,
    SurveyStart { survey_type: SurveyType },
    SurveyStepComplete { step_id: String },
    SurveyComplete,
    SignupClick,
    Signup { method: SignupMethod },
    DialogClose,
    RecommendationInterestClick,
}

impl EventKind {
    /// Payload-free discriminant used for store-side filtering.
    pub fn filter(&self) -> EventKindFilter {
        match self {
            EventKind::PageVisit => EventKindFilter::PageVisit,
            EventKind::RecommendationsPageVisit => EventKindFilter::RecommendationsPageVisit,
            EventKind::SurveyStart { .. } => EventKindFilter::SurveyStart,
            EventKind::SurveyStepComplete { .. } => EventKindFilter::SurveyStepComplete,
            EventKind::SurveyComplete => EventKindFilter::SurveyComplete,
            EventKind::SignupClick => EventKindFilter::SignupClick,
            EventKind::Signup { .. } => EventKindFilter::Signup,
            EventKind::DialogClose => EventKindFilter::DialogClose,
            EventKind::RecommendationInterestClick => EventKindFilter::RecommendationInterestClick,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKindFilter {
    PageVisit,
    RecommendationsPageVisit,
    SurveyStart,
    SurveyStepComplete,
    SurveyComplete,
    SignupClick,
    Signup,
    DialogClose,
    RecommendationInterestClick,
}

/// An immutable raw event as returned by the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub user_id: UserRef,
    pub is_anonymous: bool,
}

impl EventRecord {
    pub fn new(
        kind: EventKind,
        timestamp: DateTime<Utc>,
        user_id: impl Into<UserRef>,
        is_anonymous: bool,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            timestamp,
            user_id: user_id.into(),
            is_anonymous,
        }
    }
}

impl From<String> for UserRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}
