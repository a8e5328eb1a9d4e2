//! Unified offer record shared by all categories

use super::{CabinClass, Category};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider that supplied an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub code: String,
    pub name: String,
}

impl ProviderRef {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub formatted: String,
}

impl Price {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        let formatted = Self::format(amount, &currency);
        Self {
            amount,
            currency,
            formatted,
        }
    }

    /// Human-readable price string, e.g. `$199.00` or `CHF 120.50`
    pub fn format(amount: f64, currency: &str) -> String {
        match currency {
            "USD" => format!("${:.2}", amount),
            "EUR" => format!("€{:.2}", amount),
            "GBP" => format!("£{:.2}", amount),
            "JPY" => format!("¥{:.0}", amount),
            other => format!("{} {:.2}", other, amount),
        }
    }
}

/// Multi-factor ranking attached after scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub price_score: f64,
    pub quality_score: f64,
    pub relevance_score: f64,
    pub personalization_score: f64,
    pub freshness_score: f64,
    pub total_score: f64,
    pub rank: usize,
}

/// Equivalent offer for the same item from another provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeOffer {
    pub provider: ProviderRef,
    pub price: Price,
    pub offer_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    #[serde(default)]
    pub airlines: Vec<String>,
    #[serde(default)]
    pub flight_numbers: Vec<String>,
    #[serde(default)]
    pub stops: u32,
    #[serde(default)]
    pub total_duration_minutes: Option<u32>,
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub cabin_class: Option<CabinClass>,
    #[serde(default)]
    pub refundable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    pub name: String,
    #[serde(default)]
    pub star_rating: Option<f64>,
    #[serde(default)]
    pub guest_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub distance_from_center: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub free_cancellation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDetails {
    pub vehicle_name: String,
    pub vehicle_type: String,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub pickup_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDetails {
    pub title: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub free_cancellation: Option<bool>,
}

/// Category-specific attributes of an offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum ResultDetails {
    #[serde(rename = "flights")]
    Flight(FlightDetails),
    #[serde(rename = "hotels")]
    Hotel(HotelDetails),
    #[serde(rename = "cars")]
    Car(CarDetails),
    #[serde(rename = "experiences")]
    Experience(ExperienceDetails),
}

/// Normalized offer from any provider and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedResult {
    pub id: String,
    pub provider: ProviderRef,
    pub price: Price,
    #[serde(default)]
    pub retrieved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Ranking>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<AlternativeOffer>,
    #[serde(flatten)]
    pub details: ResultDetails,
}

impl UnifiedResult {
    pub fn new(
        id: impl Into<String>,
        provider: ProviderRef,
        price: Price,
        details: ResultDetails,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            price,
            retrieved_at: None,
            ranking: None,
            alternatives: Vec::new(),
            details,
        }
    }

    pub fn with_retrieved_at(mut self, at: DateTime<Utc>) -> Self {
        self.retrieved_at = Some(at);
        self
    }

    pub fn category(&self) -> Category {
        match self.details {
            ResultDetails::Flight(_) => Category::Flights,
            ResultDetails::Hotel(_) => Category::Hotels,
            ResultDetails::Car(_) => Category::Cars,
            ResultDetails::Experience(_) => Category::Experiences,
        }
    }

    /// Alternative entry describing this offer
    pub fn as_alternative(&self) -> AlternativeOffer {
        AlternativeOffer {
            provider: self.provider.clone(),
            price: self.price.clone(),
            offer_id: self.id.clone(),
        }
    }
}
