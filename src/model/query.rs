//! Search request, parsed query, and enrichment types

use super::Category;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Requested search mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Unified,
    Flight,
    Hotel,
    Car,
    Experience,
    Package,
    Plan,
}

/// Kind of place a location query refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    #[default]
    City,
    Airport,
    Region,
    Country,
    Landmark,
}

/// Free-text location as typed by the user, optionally with a known code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub location_type: LocationType,
}

impl LocationQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            code: None,
            location_type: LocationType::City,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    Exact,
    Flexible,
}

/// Dates as supplied in a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub flexible: bool,
    #[serde(default)]
    pub flex_days: Option<u32>,
}

/// Normalized date query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateQuery {
    #[serde(rename = "type")]
    pub kind: DateKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

/// Traveler counts as supplied in a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerRequest {
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub children: Option<u32>,
    #[serde(default)]
    pub children_ages: Vec<u32>,
    #[serde(default)]
    pub infants: Option<u32>,
}

/// Normalized traveler profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Travelers {
    pub adults: u32,
    pub children: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children_ages: Vec<u32>,
    pub infants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabin_class: Option<CabinClass>,
}

impl Travelers {
    pub fn total(&self) -> u32 {
        self.adults + self.children + self.infants
    }
}

/// Scalar value used in filters and option lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Display label used for filter options
    pub fn label(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

/// Value selected for one filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    List(Vec<Scalar>),
    Range { min: Option<f64>, max: Option<f64> },
    Single(Scalar),
}

/// Per-request options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Raw search request from the UI layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub destination: Option<LocationQuery>,
    #[serde(default)]
    pub origin: Option<LocationQuery>,
    #[serde(default)]
    pub dates: Option<DateRequest>,
    #[serde(default)]
    pub travelers: Option<TravelerRequest>,
    #[serde(default)]
    pub cabin_class: Option<CabinClass>,
    #[serde(default)]
    pub mode: Option<SearchMode>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub options: SearchOptions,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

/// Parsed search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub mode: Option<SearchMode>,
    pub categories: Vec<Category>,
    pub destination: LocationQuery,
    pub origin: Option<LocationQuery>,
    pub dates: DateQuery,
    pub travelers: Travelers,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    pub sort_by: Option<String>,
    pub pagination: Pagination,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Location resolved against the destination catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub timezone: Option<String>,
    /// True when the catalog had no match and the record was synthesized
    #[serde(default)]
    pub synthesized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetLevel {
    Budget,
    MidRange,
    Luxury,
}

impl BudgetLevel {
    /// Whether a price falls into this budget tier
    pub fn matches(&self, amount: f64) -> bool {
        match self {
            BudgetLevel::Budget => amount < 200.0,
            BudgetLevel::MidRange => (200.0..500.0).contains(&amount),
            BudgetLevel::Luxury => amount >= 500.0,
        }
    }
}

/// Preferences of an authenticated user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub budget_level: Option<BudgetLevel>,
    #[serde(default)]
    pub preferred_airlines: Vec<String>,
    #[serde(default)]
    pub travel_style: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub search_history: Vec<String>,
}

/// Destination-level pricing and seasonality knowledge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationIntel {
    pub code: String,
    #[serde(default)]
    pub seasonality: Option<String>,
    #[serde(default)]
    pub peak_months: Vec<u32>,
    #[serde(default)]
    pub avg_hotel_price: Option<f64>,
    #[serde(default)]
    pub avg_flight_price: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Book,
    Plan,
    Compare,
    Explore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSignal {
    pub name: String,
    pub weight: f64,
}

/// Inferred purpose of the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
    pub primary: IntentKind,
    pub confidence: f64,
    pub signals: Vec<IntentSignal>,
}

/// Parsed query plus everything learned during enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedQuery {
    pub query: SearchQuery,
    pub destination: ResolvedLocation,
    pub origin: Option<ResolvedLocation>,
    pub preferences: Option<UserPreferences>,
    pub intel: Option<DestinationIntel>,
    pub intent: SearchIntent,
    pub searched_at: DateTime<Utc>,
    pub currency: String,
}
