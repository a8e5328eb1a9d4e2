//! Follow-up hints derived from the search intent and destination intel

use crate::model::{EnrichedQuery, IntentKind};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    PriceAlert,
    BookSoon,
    SaveOffers,
    CompareProviders,
    FlexibleDates,
    PeakSeason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub message: String,
}

impl Suggestion {
    fn new(kind: SuggestionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Suggestions for a completed search
pub fn suggestions_for(query: &EnrichedQuery) -> Vec<Suggestion> {
    let destination = &query.destination.name;
    let mut out = match query.intent.primary {
        IntentKind::Book => vec![
            Suggestion::new(
                SuggestionKind::PriceAlert,
                format!("Set a price alert for {} to catch drops", destination),
            ),
            Suggestion::new(
                SuggestionKind::BookSoon,
                "Prices for your dates tend to rise closer to departure",
            ),
        ],
        IntentKind::Plan => vec![Suggestion::new(
            SuggestionKind::SaveOffers,
            "Save offers you like and compare them later",
        )],
        IntentKind::Compare => vec![Suggestion::new(
            SuggestionKind::CompareProviders,
            "Compare the same offer across providers to find the best price",
        )],
        IntentKind::Explore => vec![Suggestion::new(
            SuggestionKind::FlexibleDates,
            "Try flexible dates to see cheaper options",
        )],
    };

    if is_peak_season(query) {
        out.push(Suggestion::new(
            SuggestionKind::PeakSeason,
            format!(
                "{} is in high season, so book early for better availability",
                destination
            ),
        ));
    }

    out
}

/// Travel month is the start date's month, or the search month without dates
fn is_peak_season(query: &EnrichedQuery) -> bool {
    let Some(intel) = &query.intel else {
        return false;
    };
    let month = query
        .query
        .dates
        .start_date
        .map(|d| d.month())
        .unwrap_or_else(|| query.searched_at.month());
    intel.peak_months.contains(&month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::model::{
        DateRequest, DestinationIntel, IntentSignal, LocationQuery, SearchIntent, SearchRequest,
    };
    use crate::query::{parse_search_query, synthesize_location};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn query(primary: IntentKind, start: Option<NaiveDate>, peak: Vec<u32>) -> EnrichedQuery {
        let req = SearchRequest {
            destination: Some(LocationQuery::new("Paris")),
            dates: Some(DateRequest {
                start_date: start,
                ..Default::default()
            }),
            ..Default::default()
        };
        let parsed = parse_search_query(&req, &SearchConfig::default()).unwrap();
        EnrichedQuery {
            destination: synthesize_location(&parsed.destination),
            origin: None,
            query: parsed,
            preferences: None,
            intel: Some(DestinationIntel {
                code: "PAR".into(),
                peak_months: peak,
                ..Default::default()
            }),
            intent: SearchIntent {
                primary,
                confidence: 0.5,
                signals: vec![IntentSignal {
                    name: "specific_dates".into(),
                    weight: 0.8,
                }],
            },
            searched_at: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
            currency: "USD".into(),
        }
    }

    fn kinds(s: &[Suggestion]) -> Vec<SuggestionKind> {
        s.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_intent_suggestions() {
        let book = suggestions_for(&query(IntentKind::Book, None, vec![]));
        assert_eq!(
            kinds(&book),
            vec![SuggestionKind::PriceAlert, SuggestionKind::BookSoon]
        );

        let explore = suggestions_for(&query(IntentKind::Explore, None, vec![]));
        assert_eq!(kinds(&explore), vec![SuggestionKind::FlexibleDates]);
    }

    #[test]
    fn test_peak_season_uses_travel_month() {
        let july = NaiveDate::from_ymd_opt(2026, 7, 14);

        let peak = suggestions_for(&query(IntentKind::Plan, july, vec![6, 7, 8]));
        assert_eq!(
            kinds(&peak),
            vec![SuggestionKind::SaveOffers, SuggestionKind::PeakSeason]
        );

        // Searched in March, travelling in July
        let off_peak = suggestions_for(&query(IntentKind::Plan, july, vec![3]));
        assert_eq!(kinds(&off_peak), vec![SuggestionKind::SaveOffers]);

        // No dates: search month counts
        let undated = suggestions_for(&query(IntentKind::Compare, None, vec![3]));
        assert!(kinds(&undated).contains(&SuggestionKind::PeakSeason));
    }
}
