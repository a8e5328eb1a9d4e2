//! Provider manager serving offers from a JSON document
//!
//! Used by the command line front end and by tests. The document holds one
//! array of raw offer records per category:
//!
//! ```json
//! {
//!   "source": "live",
//!   "failing": ["cars"],
//!   "hotels": [{"provider": {"code": "bk", "name": "Booker"},
//!               "price": {"amount": 120, "currency": "EUR"},
//!               "name": "Hotel Lumiere"}]
//! }
//! ```
//!
//! Records may omit `id` and `category`; both are filled in on load.

use super::{
    CarSearchParams, ExperienceSearchParams, FlightSearchParams, HotelSearchParams,
    ProviderManager, ProviderResponse, ResultSource,
};
use crate::error::{Result, TripError};
use crate::model::{Category, Price, UnifiedResult};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

const DEMO_OFFERS: &str = include_str!("demo_offers.json");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureFile {
    #[serde(default)]
    source: ResultSource,
    #[serde(default)]
    failing: Vec<Category>,
    #[serde(default)]
    latency_ms: u64,
    #[serde(default)]
    flights: Vec<Value>,
    #[serde(default)]
    hotels: Vec<Value>,
    #[serde(default)]
    cars: Vec<Value>,
    #[serde(default)]
    experiences: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureProviders {
    offers: BTreeMap<Category, Vec<UnifiedResult>>,
    source: ResultSource,
    failing: Vec<Category>,
    latency: Duration,
}

impl FixtureProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo inventory compiled into the binary
    pub fn demo() -> Result<Self> {
        Self::from_json_str(DEMO_OFFERS)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TripError::Io {
            source: e,
            context: format!("Failed to read offers file: {}", path.display()),
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(content)
            .map_err(|e| TripError::json(e, "Failed to parse offers file"))?;

        let mut providers = Self {
            source: file.source,
            failing: file.failing,
            latency: Duration::from_millis(file.latency_ms),
            ..Default::default()
        };

        for (category, records) in [
            (Category::Flights, file.flights),
            (Category::Hotels, file.hotels),
            (Category::Cars, file.cars),
            (Category::Experiences, file.experiences),
        ] {
            let offers = records
                .into_iter()
                .map(|record| normalize_record(category, record))
                .collect::<Result<Vec<_>>>()?;
            providers.offers.insert(category, offers);
        }

        tracing::debug!(
            "Loaded fixture offers: {}",
            providers
                .offers
                .iter()
                .map(|(c, o)| format!("{}={}", c, o.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(providers)
    }

    pub fn with_offers(mut self, category: Category, offers: Vec<UnifiedResult>) -> Self {
        self.offers.insert(category, offers);
        self
    }

    /// Make every call for `category` fail
    pub fn failing(mut self, category: Category) -> Self {
        self.failing.push(category);
        self
    }

    pub fn with_source(mut self, source: ResultSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn respond(&self, category: Category) -> anyhow::Result<ProviderResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing.contains(&category) {
            anyhow::bail!("{} provider unavailable", category);
        }

        let now = Utc::now();
        let results = self
            .offers
            .get(&category)
            .map(|offers| {
                offers
                    .iter()
                    .cloned()
                    .map(|offer| match offer.retrieved_at {
                        Some(_) => offer,
                        None => offer.with_retrieved_at(now),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            results,
            source: self.source,
        })
    }
}

/// Fill in the category tag, a generated id and the formatted price
fn normalize_record(category: Category, mut record: Value) -> Result<UnifiedResult> {
    if let Some(fields) = record.as_object_mut() {
        fields
            .entry("category")
            .or_insert_with(|| Value::String(category.as_str().to_string()));
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    }

    let mut offer: UnifiedResult = serde_json::from_value(record)
        .map_err(|e| TripError::json(e, format!("Invalid {} offer record", category)))?;

    if offer.category() != category {
        return Err(TripError::Validation(format!(
            "Offer {} listed under {} but tagged {}",
            offer.id,
            category,
            offer.category()
        )));
    }

    if offer.price.formatted.is_empty() {
        offer.price = Price::new(offer.price.amount, offer.price.currency.clone());
    }
    Ok(offer)
}

#[async_trait]
impl ProviderManager for FixtureProviders {
    async fn search_flights(
        &self,
        params: &FlightSearchParams,
    ) -> anyhow::Result<ProviderResponse> {
        tracing::debug!("Fixture flight search over {} segments", params.segments.len());
        self.respond(Category::Flights).await
    }

    async fn search_hotels(&self, params: &HotelSearchParams) -> anyhow::Result<ProviderResponse> {
        tracing::debug!("Fixture hotel search in {}", params.destination);
        self.respond(Category::Hotels).await
    }

    async fn search_cars(&self, params: &CarSearchParams) -> anyhow::Result<ProviderResponse> {
        tracing::debug!("Fixture car search at {}", params.pickup_location);
        self.respond(Category::Cars).await
    }

    async fn search_experiences(
        &self,
        params: &ExperienceSearchParams,
    ) -> anyhow::Result<ProviderResponse> {
        tracing::debug!("Fixture experience search in {}", params.destination);
        self.respond(Category::Experiences).await
    }
}
