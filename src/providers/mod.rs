//! Provider Manager seam
//!
//! The engine talks to travel inventory through [`ProviderManager`], one
//! entry point per category. How providers are queried, cached and timed
//! out is the implementation's business.

mod fixture;

pub use fixture::FixtureProviders;

use crate::model::{CabinClass, Category, EnrichedQuery, Travelers, UnifiedResult};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Default driver age sent with car searches
pub const DEFAULT_DRIVER_AGE: u32 = 30;

/// Where a provider response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Cache,
    #[default]
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub results: Vec<UnifiedResult>,
    pub source: ResultSource,
}

/// One leg of a trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSegment {
    pub origin: String,
    pub destination: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchParams {
    pub segments: Vec<TripSegment>,
    pub travelers: Travelers,
    pub cabin_class: CabinClass,
    pub currency: String,
}

impl FlightSearchParams {
    /// Outbound segment plus a return segment when an end date is set;
    /// `None` without an origin
    pub fn from_query(query: &EnrichedQuery) -> Option<Self> {
        let origin = query.origin.as_ref()?;
        let destination = &query.destination;
        let dates = &query.query.dates;

        let mut segments = vec![TripSegment {
            origin: origin.code.clone(),
            destination: destination.code.clone(),
            date: dates.start_date,
        }];
        if let Some(end) = dates.end_date {
            segments.push(TripSegment {
                origin: destination.code.clone(),
                destination: origin.code.clone(),
                date: Some(end),
            });
        }

        Some(Self {
            segments,
            travelers: query.query.travelers.clone(),
            cabin_class: query
                .query
                .travelers
                .cabin_class
                .unwrap_or(CabinClass::Economy),
            currency: query.currency.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchParams {
    pub destination: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub rooms: u32,
    pub guests: u32,
    pub currency: String,
}

impl HotelSearchParams {
    pub fn from_query(query: &EnrichedQuery) -> Self {
        let travelers = &query.query.travelers;
        Self {
            destination: query.destination.code.clone(),
            check_in: query.query.dates.start_date,
            check_out: query.query.dates.end_date,
            // Two adults per room
            rooms: travelers.adults.div_ceil(2).max(1),
            guests: travelers.adults + travelers.children,
            currency: query.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchParams {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_at: Option<NaiveDateTime>,
    pub dropoff_at: Option<NaiveDateTime>,
    pub driver_age: u32,
    pub currency: String,
}

impl CarSearchParams {
    pub fn from_query(query: &EnrichedQuery) -> Self {
        let counter_opens = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default();
        let location = query.destination.code.clone();
        Self {
            pickup_location: location.clone(),
            dropoff_location: location,
            pickup_at: query.query.dates.start_date.map(|d| d.and_time(counter_opens)),
            dropoff_at: query.query.dates.end_date.map(|d| d.and_time(counter_opens)),
            driver_age: DEFAULT_DRIVER_AGE,
            currency: query.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceSearchParams {
    pub destination: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub participants: u32,
    pub currency: String,
}

impl ExperienceSearchParams {
    pub fn from_query(query: &EnrichedQuery) -> Self {
        Self {
            destination: query.destination.code.clone(),
            start_date: query.query.dates.start_date,
            end_date: query.query.dates.end_date,
            participants: query.query.travelers.total(),
            currency: query.currency.clone(),
        }
    }
}

/// Category-specific inventory search
#[async_trait]
pub trait ProviderManager: Send + Sync {
    async fn search_flights(&self, params: &FlightSearchParams)
        -> anyhow::Result<ProviderResponse>;

    async fn search_hotels(&self, params: &HotelSearchParams) -> anyhow::Result<ProviderResponse>;

    async fn search_cars(&self, params: &CarSearchParams) -> anyhow::Result<ProviderResponse>;

    async fn search_experiences(
        &self,
        params: &ExperienceSearchParams,
    ) -> anyhow::Result<ProviderResponse>;
}

/// Build the parameters for `category` and call the matching entry point
pub async fn search_category(
    providers: &dyn ProviderManager,
    category: Category,
    query: &EnrichedQuery,
) -> anyhow::Result<ProviderResponse> {
    match category {
        Category::Flights => {
            let params = FlightSearchParams::from_query(query)
                .ok_or_else(|| anyhow::anyhow!("Origin is required for flight search"))?;
            providers.search_flights(&params).await
        }
        Category::Hotels => {
            providers
                .search_hotels(&HotelSearchParams::from_query(query))
                .await
        }
        Category::Cars => providers.search_cars(&CarSearchParams::from_query(query)).await,
        Category::Experiences => {
            providers
                .search_experiences(&ExperienceSearchParams::from_query(query))
                .await
        }
    }
}
