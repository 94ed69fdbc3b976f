//! Company recommendations — page traffic and interest-click engagement.

use std::collections::HashSet;

use insights_core::{EventKind, EventRecord, UserRef};
use serde::{Deserialize, Serialize};

use crate::rate::Rate;
use crate::snapshot::{Metric, MetricBlock, MetricExtractor};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationStats {
    pub page_visits: u64,
    pub company_interest_clicks: u64,
    pub unique_company_interests: u64,
    pub company_interest_rate: Rate,
    /// Mean interest clicks per interested user, rounded to two decimals.
    pub average_companies_per_user: f64,
    pub anonymous_interests: u64,
    pub non_anonymous_interests: u64,
}

pub struct RecommendationsExtractor;

impl MetricExtractor for RecommendationsExtractor {
    fn metric(&self) -> Metric {
        Metric::Recommendations
    }

    fn extract(&self, events: &[EventRecord]) -> MetricBlock {
        let mut page_visits = 0u64;
        let mut clicks = 0u64;
        let mut interested: HashSet<&UserRef> = HashSet::new();
        let mut anonymous_interested: HashSet<&UserRef> = HashSet::new();

        for event in events {
            match &event.kind {
                EventKind::RecommendationsPageVisit => page_visits += 1,
                EventKind::RecommendationInterestClick => {
                    clicks += 1;
                    interested.insert(&event.user_id);
                    if event.is_anonymous {
                        anonymous_interested.insert(&event.user_id);
                    }
                }
                _ => {}
            }
        }

        let unique = interested.len() as u64;
        let anonymous = anonymous_interested.len() as u64;
        let average = if unique == 0 {
            0.0
        } else {
            (clicks as f64 / unique as f64 * 100.0).round() / 100.0
        };

        MetricBlock::Recommendations(RecommendationStats {
            page_visits,
            company_interest_clicks: clicks,
            unique_company_interests: unique,
            company_interest_rate: Rate::of(unique, page_visits),
            average_companies_per_user: average,
            anonymous_interests: anonymous,
            non_anonymous_interests: unique - anonymous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page_visit(user: &str) -> EventRecord {
        EventRecord::new(EventKind::RecommendationsPageVisit, Utc::now(), user, false)
    }

    fn interest(user: &str, anonymous: bool) -> EventRecord {
        EventRecord::new(
            EventKind::RecommendationInterestClick,
            Utc::now(),
            user,
            anonymous,
        )
    }

    fn extract(events: &[EventRecord]) -> RecommendationStats {
        match RecommendationsExtractor.extract(events) {
            MetricBlock::Recommendations(stats) => stats,
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_interest_rate_and_average() {
        let events = vec![
            page_visit("u1"),
            page_visit("u2"),
            page_visit("u3"),
            page_visit("u4"),
            interest("u1", true),
            interest("u1", true),
            interest("u1", true),
            interest("u2", false),
        ];
        let stats = extract(&events);
        assert_eq!(stats.page_visits, 4);
        assert_eq!(stats.company_interest_clicks, 4);
        assert_eq!(stats.unique_company_interests, 2);
        assert_eq!(stats.company_interest_rate.display(), "50%");
        assert_eq!(stats.average_companies_per_user, 2.0);
        assert_eq!(stats.anonymous_interests, 1);
        assert_eq!(stats.non_anonymous_interests, 1);
    }

    #[test]
    fn test_no_page_visits_means_zero_rate() {
        let events = vec![interest("u1", false)];
        let stats = extract(&events);
        assert_eq!(stats.company_interest_rate.display(), "0%");
        assert_eq!(stats.average_companies_per_user, 1.0);
    }

    #[test]
    fn test_no_interested_users_means_zero_average() {
        let events = vec![page_visit("u1")];
        let stats = extract(&events);
        assert_eq!(stats.average_companies_per_user, 0.0);
        assert_eq!(stats.company_interest_rate.display(), "0%");
    }
}
