//! Sort options and result ordering

use super::fields::field_value;
use crate::model::{Category, UnifiedResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    Recommended,
    PriceLow,
    PriceHigh,
    DurationShort,
    RatingHigh,
    DistanceNear,
    DepartureEarly,
    Popular,
}

impl SortOption {
    pub const ALL: [SortOption; 8] = [
        SortOption::Recommended,
        SortOption::PriceLow,
        SortOption::PriceHigh,
        SortOption::DurationShort,
        SortOption::RatingHigh,
        SortOption::DistanceNear,
        SortOption::DepartureEarly,
        SortOption::Popular,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Recommended => "recommended",
            SortOption::PriceLow => "price_low",
            SortOption::PriceHigh => "price_high",
            SortOption::DurationShort => "duration_short",
            SortOption::RatingHigh => "rating_high",
            SortOption::DistanceNear => "distance_near",
            SortOption::DepartureEarly => "departure_early",
            SortOption::Popular => "popular",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOption::Recommended => "Recommended",
            SortOption::PriceLow => "Price: low to high",
            SortOption::PriceHigh => "Price: high to low",
            SortOption::DurationShort => "Shortest duration",
            SortOption::RatingHigh => "Highest rated",
            SortOption::DistanceNear => "Closest to center",
            SortOption::DepartureEarly => "Earliest departure",
            SortOption::Popular => "Most popular",
        }
    }

    /// Field paths tried in order; a record sorts by the first one it has
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            SortOption::Recommended => &["ranking.totalScore"],
            SortOption::PriceLow | SortOption::PriceHigh => &["price.amount"],
            SortOption::DurationShort => &["totalDurationMinutes", "durationMinutes"],
            SortOption::RatingHigh => &["guestRating", "rating"],
            SortOption::DistanceNear => &["distanceFromCenter"],
            SortOption::DepartureEarly => &["departureTime"],
            SortOption::Popular => &["reviewCount"],
        }
    }

    pub fn descending(&self) -> bool {
        matches!(
            self,
            SortOption::Recommended
                | SortOption::PriceHigh
                | SortOption::RatingHigh
                | SortOption::Popular
        )
    }

    fn key(&self, result: &UnifiedResult) -> Option<f64> {
        self.fields()
            .iter()
            .find_map(|path| field_value(result, path).as_number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptionInfo {
    pub value: String,
    pub label: String,
}

/// Reorder results in place; returns false for an unknown option
pub fn sort_in_place(results: &mut [UnifiedResult], sort_by: &str) -> bool {
    let Some(option) = SortOption::parse(sort_by) else {
        tracing::debug!("Ignoring unknown sort option: {}", sort_by);
        return false;
    };

    results.sort_by(|a, b| match (option.key(a), option.key(b)) {
        (Some(x), Some(y)) if option.descending() => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        // Missing values go last in either direction
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    true
}

pub fn sort_results(mut results: Vec<UnifiedResult>, sort_by: &str) -> Vec<UnifiedResult> {
    sort_in_place(&mut results, sort_by);
    results
}

/// Sort options offered for a category
pub fn sort_options(category: Category) -> Vec<SortOptionInfo> {
    let mut options = vec![
        SortOption::Recommended,
        SortOption::PriceLow,
        SortOption::PriceHigh,
    ];
    match category {
        Category::Flights => {
            options.extend([SortOption::DurationShort, SortOption::DepartureEarly])
        }
        Category::Hotels => options.extend([SortOption::RatingHigh, SortOption::DistanceNear]),
        Category::Experiences => options.extend([SortOption::RatingHigh, SortOption::Popular]),
        Category::Cars => {}
    }

    options
        .into_iter()
        .map(|o| SortOptionInfo {
            value: o.as_str().to_string(),
            label: o.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExperienceDetails, HotelDetails, Price, ProviderRef, ResultDetails};

    fn hotel(id: &str, price: f64, guest: Option<f64>, distance: Option<f64>) -> UnifiedResult {
        UnifiedResult::new(
            id,
            ProviderRef::new("bk", "Booker"),
            Price::new(price, "USD"),
            ResultDetails::Hotel(HotelDetails {
                name: id.to_string(),
                guest_rating: guest,
                distance_from_center: distance,
                ..Default::default()
            }),
        )
    }

    fn ids(results: &[UnifiedResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<UnifiedResult> {
        vec![
            hotel("a", 180.0, Some(7.5), None),
            hotel("b", 90.0, None, Some(0.4)),
            hotel("c", 250.0, Some(9.1), Some(4.0)),
            hotel("d", 90.0, Some(8.0), Some(1.2)),
        ]
    }

    #[test]
    fn test_price_sorts_are_stable() {
        assert_eq!(ids(&sort_results(sample(), "price_low")), vec!["b", "d", "a", "c"]);
        assert_eq!(ids(&sort_results(sample(), "price_high")), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_missing_values_sort_last() {
        assert_eq!(ids(&sort_results(sample(), "rating_high")), vec!["c", "d", "a", "b"]);
        assert_eq!(ids(&sort_results(sample(), "distance_near")), vec!["b", "d", "c", "a"]);
        // Nothing is ranked yet, so recommended keeps input order
        assert_eq!(ids(&sort_results(sample(), "recommended")), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_unknown_option_is_noop() {
        let input = sample();
        assert_eq!(sort_results(input.clone(), "not_a_real_option"), input);
        let mut copy = input.clone();
        assert!(!sort_in_place(&mut copy, "cheapest"));
        assert_eq!(copy, input);
    }

    #[test]
    fn test_rating_falls_back_to_experience_rating() {
        let tour = UnifiedResult::new(
            "t",
            ProviderRef::new("gy", "Guide"),
            Price::new(60.0, "USD"),
            ResultDetails::Experience(ExperienceDetails {
                title: "Louvre tour".into(),
                rating: Some(4.8),
                ..Default::default()
            }),
        );
        let cruise = UnifiedResult::new(
            "u",
            ProviderRef::new("gy", "Guide"),
            Price::new(40.0, "USD"),
            ResultDetails::Experience(ExperienceDetails {
                title: "Seine cruise".into(),
                rating: Some(4.2),
                ..Default::default()
            }),
        );
        let sorted = sort_results(vec![cruise, tour], "rating_high");
        assert_eq!(ids(&sorted), vec!["t", "u"]);
    }

    #[test]
    fn test_sort_options_per_category() {
        let values = |c| -> Vec<String> { sort_options(c).into_iter().map(|o| o.value).collect() };
        assert_eq!(
            values(Category::Flights),
            vec!["recommended", "price_low", "price_high", "duration_short", "departure_early"]
        );
        assert_eq!(
            values(Category::Hotels),
            vec!["recommended", "price_low", "price_high", "rating_high", "distance_near"]
        );
        assert_eq!(values(Category::Cars).len(), 3);
        assert!(values(Category::Experiences).contains(&"popular".to_string()));
    }
}
