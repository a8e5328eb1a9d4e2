//! Shared data model
//!
//! Types consumed by every engine component: categories, queries, and the
//! unified offer record produced by provider adapters.

mod offer;
mod query;

pub use offer::{
    AlternativeOffer, CarDetails, ExperienceDetails, FlightDetails, HotelDetails, Price,
    ProviderRef, Ranking, ResultDetails, UnifiedResult,
};
pub use query::{
    BudgetLevel, CabinClass, Coordinates, DateKind, DateQuery, DateRequest, DestinationIntel,
    EnrichedQuery, FilterValue, IntentKind, IntentSignal, LocationQuery, LocationType,
    Pagination, ResolvedLocation, Scalar, SearchIntent, SearchMode, SearchOptions, SearchQuery,
    SearchRequest, TravelerRequest, Travelers, UserPreferences,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inventory category searched and ranked independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flights,
    Hotels,
    Cars,
    Experiences,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Flights,
        Category::Hotels,
        Category::Cars,
        Category::Experiences,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flights => "flights",
            Category::Hotels => "hotels",
            Category::Cars => "cars",
            Category::Experiences => "experiences",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flights" | "flight" => Ok(Category::Flights),
            "hotels" | "hotel" => Ok(Category::Hotels),
            "cars" | "car" => Ok(Category::Cars),
            "experiences" | "experience" => Ok(Category::Experiences),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}
