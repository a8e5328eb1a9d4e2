//! Weighted-signal search intent model

use crate::model::{DateKind, IntentKind, IntentSignal, SearchMode, SearchQuery, SearchIntent};
use chrono::{DateTime, Utc};

const SPECIFIC_DATES: (&str, f64) = ("specific_dates", 0.8);
const DETAILED_TRAVELERS: (&str, f64) = ("detailed_travelers", 0.7);
const URGENT: (&str, f64) = ("urgent", 0.9);
const SOON: (&str, f64) = ("soon", 0.6);
const REPEAT_SEARCH: (&str, f64) = ("repeat_search", 0.6);

/// Booking-signal share above which the intent is `book`
const BOOK_RATIO: f64 = 0.6;

/// Classify what the user is trying to accomplish
///
/// `history` is the user's previous searches (empty for anonymous users).
pub fn detect_intent(query: &SearchQuery, history: &[String], now: DateTime<Utc>) -> SearchIntent {
    let mut signals: Vec<(IntentSignal, bool)> = Vec::new();
    let mut push = |(name, weight): (&str, f64), booking: bool| {
        signals.push((
            IntentSignal {
                name: name.to_string(),
                weight,
            },
            booking,
        ));
    };

    if query.dates.kind == DateKind::Exact && query.dates.start_date.is_some() {
        push(SPECIFIC_DATES, true);
    }

    if query.travelers.cabin_class.is_some() {
        push(DETAILED_TRAVELERS, true);
    }

    if let Some(start) = query.dates.start_date {
        let days = (start - now.date_naive()).num_days();
        if days < 14 {
            push(URGENT, true);
        } else if days < 30 {
            push(SOON, true);
        }
    }

    let repeat = !history.is_empty();
    if repeat {
        push(REPEAT_SEARCH, false);
    }

    let total: f64 = signals.iter().map(|(s, _)| s.weight).sum();
    let booking: f64 = signals
        .iter()
        .filter(|(_, is_booking)| *is_booking)
        .map(|(s, _)| s.weight)
        .sum();

    let ratio = if total > 0.0 { booking / total } else { 0.0 };

    let primary = if ratio > BOOK_RATIO {
        IntentKind::Book
    } else if query.mode == Some(SearchMode::Plan) {
        IntentKind::Plan
    } else if repeat {
        IntentKind::Compare
    } else {
        IntentKind::Explore
    };

    SearchIntent {
        primary,
        confidence: if signals.is_empty() { 0.5 } else { ratio },
        signals: signals.into_iter().map(|(s, _)| s).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::model::{CabinClass, DateRequest, LocationQuery, SearchRequest};
    use crate::query::parse_search_query;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    fn query_with(days_out: Option<i64>, flexible: bool, mode: Option<SearchMode>) -> SearchQuery {
        let req = SearchRequest {
            destination: Some(LocationQuery::new("Paris")),
            mode,
            dates: days_out.map(|d| DateRequest {
                start_date: Some((now() + Duration::days(d)).date_naive()),
                end_date: None,
                flexible,
                flex_days: None,
            }),
            ..Default::default()
        };
        parse_search_query(&req, &SearchConfig::default()).unwrap()
    }

    #[test]
    fn test_no_signals_explores() {
        let intent = detect_intent(&query_with(None, false, None), &[], now());
        assert_eq!(intent.primary, IntentKind::Explore);
        assert_eq!(intent.confidence, 0.5);
        assert!(intent.signals.is_empty());
    }

    #[test]
    fn test_exact_urgent_dates_book() {
        let intent = detect_intent(&query_with(Some(7), false, None), &[], now());
        assert_eq!(intent.primary, IntentKind::Book);
        assert_eq!(intent.confidence, 1.0);
        let names: Vec<&str> = intent.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["specific_dates", "urgent"]);
    }

    #[test]
    fn test_soon_excludes_urgent() {
        let intent = detect_intent(&query_with(Some(20), true, None), &[], now());
        let names: Vec<&str> = intent.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["soon"]);
        assert_eq!(intent.primary, IntentKind::Book);
    }

    #[test]
    fn test_past_start_date_is_urgent() {
        let intent = detect_intent(&query_with(Some(-3), true, None), &[], now());
        let names: Vec<&str> = intent.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["urgent"]);
        assert_eq!(intent.primary, IntentKind::Book);
    }

    #[test]
    fn test_history_dilutes_booking_ratio() {
        // specific dates 0.8 vs repeat 0.6: ratio 0.571 stays under the book cut-off
        let history = vec!["Paris".to_string()];
        let intent = detect_intent(&query_with(Some(90), false, None), &history, now());
        assert_eq!(intent.primary, IntentKind::Compare);
        assert!((intent.confidence - 0.8 / 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_plan_mode() {
        let history = vec!["Rome".to_string()];
        let intent = detect_intent(
            &query_with(None, false, Some(SearchMode::Plan)),
            &history,
            now(),
        );
        assert_eq!(intent.primary, IntentKind::Plan);
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn test_cabin_class_signal() {
        let mut query = query_with(Some(120), true, None);
        query.travelers.cabin_class = Some(CabinClass::First);
        let intent = detect_intent(&query, &["x".to_string()], now());
        // detailed 0.7 vs repeat 0.6
        assert!((intent.confidence - 0.7 / 1.3).abs() < 1e-9);
        assert_eq!(intent.primary, IntentKind::Compare);
    }
}
