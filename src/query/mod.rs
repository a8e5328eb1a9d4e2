//! Query processing
//!
//! Parses raw requests, resolves locations against the destination catalog,
//! looks up user preferences and destination intelligence, and infers the
//! search intent.

mod intent;
mod parser;

pub use intent::detect_intent;
pub use parser::{categories_for, parse_search_query};

use crate::catalog::{DestinationCatalog, PreferenceStore};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::model::{
    DestinationIntel, EnrichedQuery, LocationQuery, ResolvedLocation, SearchQuery, SearchRequest,
    UserPreferences,
};
use chrono::Utc;
use std::sync::Arc;

/// Country marker for locations the catalog does not know
pub const UNKNOWN_COUNTRY: &str = "Unknown";

pub struct QueryProcessor {
    catalog: Arc<dyn DestinationCatalog>,
    preferences: Arc<dyn PreferenceStore>,
    config: SearchConfig,
}

impl QueryProcessor {
    pub fn new(
        catalog: Arc<dyn DestinationCatalog>,
        preferences: Arc<dyn PreferenceStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            catalog,
            preferences,
            config,
        }
    }

    pub fn parse(&self, request: &SearchRequest) -> Result<SearchQuery> {
        parse_search_query(request, &self.config)
    }

    /// Enrich a parsed query
    ///
    /// The four lookups run concurrently; any that fails or finds nothing
    /// leaves its part of the result empty instead of failing the search.
    pub async fn enrich(&self, query: SearchQuery, user_id: Option<&str>) -> EnrichedQuery {
        let destination = self.resolve_location(&query.destination);
        let origin = async {
            match &query.origin {
                Some(origin) => Some(self.resolve_location(origin).await),
                None => None,
            }
        };
        let preferences = async {
            match user_id {
                Some(id) => self.lookup_preferences(id).await,
                None => None,
            }
        };
        let intel = async {
            match &query.destination.code {
                Some(code) => self.lookup_intel(code).await,
                None => None,
            }
        };

        let (destination, origin, preferences, intel) =
            tokio::join!(destination, origin, preferences, intel);

        let searched_at = Utc::now();
        let history = preferences
            .as_ref()
            .map(|p| p.search_history.as_slice())
            .unwrap_or(&[]);
        let intent = detect_intent(&query, history, searched_at);
        let currency = query
            .currency
            .clone()
            .unwrap_or_else(|| self.config.default_currency.clone());

        tracing::debug!(
            "Enriched query for {} ({}): intent {:?} at {:.2}",
            destination.name,
            destination.code,
            intent.primary,
            intent.confidence
        );

        EnrichedQuery {
            query,
            destination,
            origin,
            preferences,
            intel,
            intent,
            searched_at,
            currency,
        }
    }

    /// Provider-specific query tuning hook; currently a pass-through
    pub fn optimize(&self, query: EnrichedQuery) -> EnrichedQuery {
        query
    }

    async fn resolve_location(&self, location: &LocationQuery) -> ResolvedLocation {
        let lookup = match &location.code {
            Some(code) => match self.catalog.lookup(code).await {
                Ok(None) => self.catalog.lookup(&location.query).await,
                other => other,
            },
            None => self.catalog.lookup(&location.query).await,
        };

        match lookup {
            Ok(Some(destination)) => destination.to_resolved(),
            Ok(None) => {
                tracing::debug!("No catalog match for '{}', synthesizing", location.query);
                synthesize_location(location)
            }
            Err(e) => {
                tracing::warn!("Destination lookup failed for '{}': {}", location.query, e);
                synthesize_location(location)
            }
        }
    }

    async fn lookup_preferences(&self, user_id: &str) -> Option<UserPreferences> {
        match self.preferences.preferences(user_id).await {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!("Preference lookup failed for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn lookup_intel(&self, code: &str) -> Option<DestinationIntel> {
        match self.catalog.intelligence(code).await {
            Ok(intel) => intel,
            Err(e) => {
                tracing::warn!("Destination intelligence lookup failed for {}: {}", code, e);
                None
            }
        }
    }
}

/// Fallback record for a location the catalog does not know
pub fn synthesize_location(location: &LocationQuery) -> ResolvedLocation {
    let code = match &location.code {
        Some(code) => code.clone(),
        None => {
            let mut code: String = location
                .query
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .take(3)
                .collect::<String>()
                .to_uppercase();
            while code.len() < 3 {
                code.push('X');
            }
            code
        }
    };

    ResolvedLocation {
        code,
        name: location.query.clone(),
        location_type: location.location_type,
        country: UNKNOWN_COUNTRY.to_string(),
        coordinates: None,
        timezone: None,
        synthesized: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Destination, InMemoryCatalog, StaticPreferences};
    use crate::error::TripError;
    use crate::model::{BudgetLevel, SearchMode};
    use async_trait::async_trait;

    struct BrokenCatalog;

    #[async_trait]
    impl DestinationCatalog for BrokenCatalog {
        async fn lookup(&self, _code_or_name: &str) -> Result<Option<Destination>> {
            Err(TripError::Catalog("catalog offline".to_string()))
        }

        async fn intelligence(&self, _code: &str) -> Result<Option<DestinationIntel>> {
            Err(TripError::Catalog("catalog offline".to_string()))
        }

        async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<Destination>> {
            Ok(Vec::new())
        }

        async fn trending(&self, _limit: usize) -> Result<Vec<Destination>> {
            Ok(Vec::new())
        }
    }

    fn processor() -> QueryProcessor {
        let prefs = StaticPreferences::new().with_user(
            "traveler-1",
            UserPreferences {
                budget_level: Some(BudgetLevel::MidRange),
                search_history: vec!["Lisbon".to_string()],
                ..Default::default()
            },
        );
        QueryProcessor::new(
            Arc::new(InMemoryCatalog::bundled().unwrap()),
            Arc::new(prefs),
            SearchConfig::default(),
        )
    }

    fn request(destination: LocationQuery, origin: Option<LocationQuery>) -> SearchRequest {
        SearchRequest {
            destination: Some(destination),
            origin,
            mode: Some(SearchMode::Unified),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_enrich_resolves_catalog_locations() {
        let qp = processor();
        let query = qp
            .parse(&request(
                LocationQuery::new("Paris"),
                Some(LocationQuery::new("New York")),
            ))
            .unwrap();

        let enriched = qp.enrich(query, None).await;
        assert_eq!(enriched.destination.code, "PAR");
        assert!(!enriched.destination.synthesized);
        assert_eq!(enriched.origin.unwrap().code, "NYC");
        assert!(enriched.preferences.is_none());
        // No code on the destination query, so no intelligence lookup
        assert!(enriched.intel.is_none());
        assert_eq!(enriched.currency, "USD");
    }

    #[tokio::test]
    async fn test_enrich_with_code_and_user() {
        let qp = processor();
        let query = qp
            .parse(&request(LocationQuery::new("Paris").with_code("PAR"), None))
            .unwrap();

        let enriched = qp.enrich(query, Some("traveler-1")).await;
        assert!(enriched.intel.is_some());
        let prefs = enriched.preferences.unwrap();
        assert_eq!(prefs.budget_level, Some(BudgetLevel::MidRange));
        assert_eq!(enriched.intent.primary, crate::model::IntentKind::Compare);
    }

    #[tokio::test]
    async fn test_unknown_destination_is_synthesized() {
        let qp = processor();
        let query = qp
            .parse(&request(LocationQuery::new("atlantis deep"), None))
            .unwrap();

        let enriched = qp.enrich(query, None).await;
        assert_eq!(enriched.destination.code, "ATL");
        assert_eq!(enriched.destination.country, UNKNOWN_COUNTRY);
        assert!(enriched.destination.synthesized);
    }

    #[tokio::test]
    async fn test_lookup_failures_degrade() {
        let qp = QueryProcessor::new(
            Arc::new(BrokenCatalog),
            Arc::new(StaticPreferences::new()),
            SearchConfig::default(),
        );
        let query = qp
            .parse(&request(LocationQuery::new("Oz").with_code("OZZ"), None))
            .unwrap();

        let enriched = qp.enrich(query, Some("nobody")).await;
        assert_eq!(enriched.destination.code, "OZZ");
        assert!(enriched.destination.synthesized);
        assert!(enriched.intel.is_none());
        assert!(enriched.preferences.is_none());
    }

    #[test]
    fn test_synthesized_code_padding() {
        let loc = synthesize_location(&LocationQuery::new("Oz"));
        assert_eq!(loc.code, "OZX");
        let loc = synthesize_location(&LocationQuery::new("14 rue"));
        assert_eq!(loc.code, "RUE");
    }

    #[test]
    fn test_optimize_is_identity() {
        let qp = processor();
        let query = qp
            .parse(&request(LocationQuery::new("Rome"), None))
            .unwrap();
        let enriched = futures::executor::block_on(qp.enrich(query, None));
        assert_eq!(qp.optimize(enriched.clone()), enriched);
    }
}
