//! Destination catalog and user preference lookups
//!
//! Both are external collaborators of the query processor. The traits are the
//! seam; `InMemoryCatalog` and `StaticPreferences` are the implementations
//! shipped with the crate.

mod memory;

pub use memory::{InMemoryCatalog, StaticPreferences};

use crate::error::Result;
use crate::model::{Coordinates, DestinationIntel, LocationType, ResolvedLocation, UserPreferences};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Flat catalog record for one destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub code: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    pub country: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Ordering key for autocomplete and trending (0-100)
    #[serde(default)]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<String>,
    #[serde(default, alias = "peak_months", skip_serializing_if = "Vec::is_empty")]
    pub peak_months: Vec<u32>,
    #[serde(default, alias = "avg_hotel_price", skip_serializing_if = "Option::is_none")]
    pub avg_hotel_price: Option<f64>,
    #[serde(default, alias = "avg_flight_price", skip_serializing_if = "Option::is_none")]
    pub avg_flight_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Destination {
    pub fn to_resolved(&self) -> ResolvedLocation {
        ResolvedLocation {
            code: self.code.clone(),
            name: self.name.clone(),
            location_type: self.location_type,
            country: self.country.clone(),
            coordinates: self.coordinates,
            timezone: self.timezone.clone(),
            synthesized: false,
        }
    }

    /// Intelligence record, present only when the entry carries pricing or seasonality data
    pub fn intel(&self) -> Option<DestinationIntel> {
        let has_data = self.seasonality.is_some()
            || !self.peak_months.is_empty()
            || self.avg_hotel_price.is_some()
            || self.avg_flight_price.is_some()
            || !self.tags.is_empty();

        has_data.then(|| DestinationIntel {
            code: self.code.clone(),
            seasonality: self.seasonality.clone(),
            peak_months: self.peak_months.clone(),
            avg_hotel_price: self.avg_hotel_price,
            avg_flight_price: self.avg_flight_price,
            tags: self.tags.clone(),
        })
    }
}

/// Keyed lookups against the destination catalog
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    /// Find by exact code, exact name or alias, then fuzzy name match
    async fn lookup(&self, code_or_name: &str) -> Result<Option<Destination>>;

    /// Seasonality and price baselines for a destination code
    async fn intelligence(&self, code: &str) -> Result<Option<DestinationIntel>>;

    /// Case-insensitive substring match on name or code, most popular first
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<Destination>>;

    /// Most popular destinations
    async fn trending(&self, limit: usize) -> Result<Vec<Destination>>;
}

/// Preference lookup for authenticated users
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn preferences(&self, user_id: &str) -> Result<Option<UserPreferences>>;
}
