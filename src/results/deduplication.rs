//! Cross-provider duplicate detection
//!
//! The same hotel or flight is often sold by several providers. Offers that
//! look alike are folded into the cheapest one, and the others are kept as
//! its alternatives.

use crate::model::{ResultDetails, UnifiedResult};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

const PRICE_CLOSE: f64 = 0.05;
const PRICE_NEAR: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub primary_id: String,
    pub duplicate_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupStats {
    pub total_input: usize,
    pub unique_output: usize,
    pub duplicates_removed: usize,
    pub duplicate_rate: f64,
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub unique_results: Vec<UnifiedResult>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub stats: DedupStats,
}

/// Drop repeated ids, keeping the first occurrence
pub fn unique_by_id(results: Vec<UnifiedResult>) -> Vec<UnifiedResult> {
    let mut seen: AHashSet<String> = AHashSet::new();

    results
        .into_iter()
        .filter(|result| seen.insert(result.id.clone()))
        .collect()
}

/// Fold cross-provider duplicates into their cheapest instance
///
/// `threshold` is on a 0-1 scale; pairs scoring at or above it merge.
pub fn deduplicate(results: Vec<UnifiedResult>, threshold: f64) -> DedupOutcome {
    let total_input = results.len();

    let mut sorted = results;
    sorted.sort_by(|a, b| a.price.amount.total_cmp(&b.price.amount));

    let mut processed = vec![false; sorted.len()];
    let mut unique_results = Vec::with_capacity(sorted.len());
    let mut duplicate_groups = Vec::new();

    for i in 0..sorted.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let mut primary = sorted[i].clone();
        let mut duplicate_ids = Vec::new();

        for j in (i + 1)..sorted.len() {
            if processed[j] {
                continue;
            }
            if similarity(&primary, &sorted[j]) >= threshold {
                processed[j] = true;
                primary.alternatives.push(sorted[j].as_alternative());
                duplicate_ids.push(sorted[j].id.clone());
            }
        }

        if !duplicate_ids.is_empty() {
            duplicate_groups.push(DuplicateGroup {
                primary_id: primary.id.clone(),
                duplicate_ids,
            });
        }
        unique_results.push(primary);
    }

    let duplicates_removed = total_input - unique_results.len();
    let stats = DedupStats {
        total_input,
        unique_output: unique_results.len(),
        duplicates_removed,
        duplicate_rate: if total_input > 0 {
            duplicates_removed as f64 / total_input as f64
        } else {
            0.0
        },
    };

    tracing::debug!(
        "Deduplicated {} results into {} ({} groups)",
        stats.total_input,
        stats.unique_output,
        duplicate_groups.len()
    );

    DedupOutcome {
        unique_results,
        duplicate_groups,
        stats,
    }
}

/// Pairwise similarity on a 0-1 scale
///
/// Offers from the same provider are never similar.
pub fn similarity(a: &UnifiedResult, b: &UnifiedResult) -> f64 {
    if a.provider.code == b.provider.code {
        return 0.0;
    }

    let score = price_proximity(a.price.amount, b.price.amount) + identity(&a.details, &b.details);
    score / 100.0
}

fn price_proximity(a: f64, b: f64) -> f64 {
    let lower = a.min(b);
    let diff = (a - b).abs();
    let ratio = if lower > 0.0 {
        diff / lower
    } else if diff == 0.0 {
        0.0
    } else {
        f64::INFINITY
    };

    if ratio <= PRICE_CLOSE {
        40.0
    } else if ratio <= PRICE_NEAR {
        20.0
    } else {
        0.0
    }
}

fn identity(a: &ResultDetails, b: &ResultDetails) -> f64 {
    match (a, b) {
        (ResultDetails::Flight(x), ResultDetails::Flight(y)) => {
            let xs: AHashSet<&str> = x.flight_numbers.iter().map(String::as_str).collect();
            let ys: AHashSet<&str> = y.flight_numbers.iter().map(String::as_str).collect();
            if !xs.is_empty() && xs == ys {
                50.0
            } else {
                0.0
            }
        }
        (ResultDetails::Hotel(x), ResultDetails::Hotel(y)) => name_match(&x.name, &y.name),
        (ResultDetails::Car(x), ResultDetails::Car(y)) => {
            let same_vehicle = !x.vehicle_name.is_empty()
                && x.vehicle_name.eq_ignore_ascii_case(&y.vehicle_name);
            let same_gearbox = match (&x.transmission, &y.transmission) {
                (Some(p), Some(q)) => p.eq_ignore_ascii_case(q),
                (None, None) => true,
                _ => false,
            };
            if same_vehicle && same_gearbox {
                50.0
            } else {
                0.0
            }
        }
        (ResultDetails::Experience(x), ResultDetails::Experience(y)) => {
            name_match(&x.title, &y.title)
        }
        _ => 0.0,
    }
}

fn name_match(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a == b {
        50.0
    } else if a.contains(&b) || b.contains(&a) {
        30.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CarDetails, FlightDetails, HotelDetails, Price, ProviderRef};

    fn flight(id: &str, provider: &str, price: f64, numbers: &[&str]) -> UnifiedResult {
        UnifiedResult::new(
            id,
            ProviderRef::new(provider, provider.to_uppercase()),
            Price::new(price, "USD"),
            ResultDetails::Flight(FlightDetails {
                flight_numbers: numbers.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
        )
    }

    fn hotel(id: &str, provider: &str, price: f64, name: &str) -> UnifiedResult {
        UnifiedResult::new(
            id,
            ProviderRef::new(provider, provider.to_uppercase()),
            Price::new(price, "USD"),
            ResultDetails::Hotel(HotelDetails {
                name: name.to_string(),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_close_flights_merge_into_cheaper() {
        let results = vec![
            flight("b", "kiwi", 208.0, &["AF007", "AF008"]),
            flight("a", "sky", 200.0, &["AF008", "AF007"]),
        ];

        let outcome = deduplicate(results, 0.85);
        assert_eq!(outcome.unique_results.len(), 1);

        let primary = &outcome.unique_results[0];
        assert_eq!(primary.id, "a");
        assert_eq!(primary.alternatives.len(), 1);
        assert_eq!(primary.alternatives[0].offer_id, "b");
        assert_eq!(primary.alternatives[0].price.amount, 208.0);

        assert_eq!(
            outcome.duplicate_groups,
            vec![DuplicateGroup {
                primary_id: "a".into(),
                duplicate_ids: vec!["b".into()],
            }]
        );
        assert_eq!(outcome.stats.duplicates_removed, 1);
        assert_eq!(outcome.stats.duplicate_rate, 0.5);
    }

    #[test]
    fn test_same_provider_never_merges() {
        let a = hotel("h1", "bk", 100.0, "Hotel Lumiere");
        let b = hotel("h2", "bk", 100.0, "Hotel Lumiere");
        assert_eq!(similarity(&a, &b), 0.0);

        let outcome = deduplicate(vec![a, b], 0.80);
        assert_eq!(outcome.unique_results.len(), 2);
        assert!(outcome.duplicate_groups.is_empty());
    }

    #[test]
    fn test_hotel_name_signals() {
        let a = hotel("h1", "bk", 100.0, "Hotel Lumiere");
        let b = hotel("h2", "xp", 104.0, "hotel lumiere");
        assert!((similarity(&a, &b) - 0.90).abs() < 1e-9);

        // Containment plus near price stays under the hotel threshold
        let c = hotel("h3", "xp", 108.0, "Lumiere");
        assert!((similarity(&a, &c) - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_price_gap_blocks_merge() {
        let a = flight("a", "sky", 200.0, &["AF007"]);
        let b = flight("b", "kiwi", 260.0, &["AF007"]);
        assert!((similarity(&a, &b) - 0.50).abs() < 1e-9);
        assert_eq!(deduplicate(vec![a, b], 0.85).unique_results.len(), 2);
    }

    #[test]
    fn test_empty_flight_numbers_are_not_identity() {
        let a = flight("a", "sky", 200.0, &[]);
        let b = flight("b", "kiwi", 200.0, &[]);
        assert!((similarity(&a, &b) - 0.40).abs() < 1e-9);
    }

    #[test]
    fn test_car_identity() {
        let car = |id: &str, provider: &str, gearbox: &str| {
            UnifiedResult::new(
                id,
                ProviderRef::new(provider, provider),
                Price::new(45.0, "USD"),
                ResultDetails::Car(CarDetails {
                    vehicle_name: "VW Golf".into(),
                    vehicle_type: "compact".into(),
                    transmission: Some(gearbox.into()),
                    ..Default::default()
                }),
            )
        };

        assert!((similarity(&car("c1", "hz", "manual"), &car("c2", "av", "Manual")) - 0.90).abs() < 1e-9);
        assert!((similarity(&car("c1", "hz", "manual"), &car("c2", "av", "automatic")) - 0.40).abs() < 1e-9);
    }

    #[test]
    fn test_every_input_accounted_for() {
        let results = vec![
            hotel("h1", "bk", 100.0, "Grand Palace"),
            hotel("h2", "xp", 102.0, "Grand Palace"),
            hotel("h3", "ag", 103.0, "grand palace"),
            hotel("h4", "bk", 300.0, "Seaside Inn"),
        ];

        let outcome = deduplicate(results, 0.80);
        let mut seen: Vec<String> = Vec::new();
        for r in &outcome.unique_results {
            seen.push(r.id.clone());
            seen.extend(r.alternatives.iter().map(|a| a.offer_id.clone()));
        }
        seen.sort();
        assert_eq!(seen, vec!["h1", "h2", "h3", "h4"]);
        assert_eq!(
            outcome.stats.unique_output + outcome.stats.duplicates_removed,
            outcome.stats.total_input
        );
    }

    #[test]
    fn test_unique_by_id_keeps_first() {
        let results = vec![
            hotel("h1", "bk", 100.0, "First"),
            hotel("h1", "xp", 90.0, "Second"),
            hotel("h2", "bk", 120.0, "Third"),
        ];

        let unique = unique_by_id(results);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].provider.code, "bk");
    }
}
