//! In-flight refresh tokens. At most one outstanding refresh per target;
//! a duplicate request is rejected rather than coalesced, so the caller
//! never doubles backend load. The permit releases on drop, including when
//! the holding task panics.

use std::sync::Arc;

use dashmap::DashMap;
use insights_core::{InsightsError, InsightsResult};
use insights_metrics::RefreshKey;
use tracing::debug;

#[derive(Clone, Default)]
pub struct RefreshGate {
    in_flight: Arc<DashMap<RefreshKey, ()>>,
}

/// Exclusive right to run the refresh for one target.
pub struct RefreshPermit {
    key: RefreshKey,
    in_flight: Arc<DashMap<RefreshKey, ()>>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn acquire(&self, key: RefreshKey) -> InsightsResult<RefreshPermit> {
        use dashmap::mapref::entry::Entry;
        match self.in_flight.entry(key) {
            Entry::Occupied(_) => Err(InsightsError::ConcurrentRefresh {
                target: key.as_str(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(());
                debug!(target = key.as_str(), "refresh permit acquired");
                Ok(RefreshPermit {
                    key,
                    in_flight: self.in_flight.clone(),
                })
            }
        }
    }

    pub fn is_in_flight(&self, key: RefreshKey) -> bool {
        self.in_flight.contains_key(&key)
    }
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let gate = RefreshGate::new();
        let permit = gate.acquire(RefreshKey::SurveySteps).unwrap();
        let result = gate.acquire(RefreshKey::SurveySteps);
        assert!(matches!(
            result,
            Err(InsightsError::ConcurrentRefresh {
                target: "surveySteps"
            })
        ));
        drop(permit);
        assert!(gate.acquire(RefreshKey::SurveySteps).is_ok());
    }

    #[test]
    fn test_targets_are_independent() {
        let gate = RefreshGate::new();
        let _steps = gate.acquire(RefreshKey::SurveySteps).unwrap();
        assert!(gate.acquire(RefreshKey::Signups).is_ok());
        assert!(gate.acquire(RefreshKey::All).is_ok());
    }

    #[test]
    fn test_permit_releases_on_panic() {
        let gate = RefreshGate::new();
        let inner = gate.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _permit = inner.acquire(RefreshKey::DialogCloses).unwrap();
            panic!("extractor blew up");
        }));
        assert!(result.is_err());
        assert!(!gate.is_in_flight(RefreshKey::DialogCloses));
    }
}
