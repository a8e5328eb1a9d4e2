//! Result processing: deduplication, ranking, filtering and sorting
//!
//! Everything here is a pure function of its inputs. [`ResultProcessor`]
//! bundles the functions with the configured thresholds and weights.

mod deduplication;
mod fields;
mod filters;
mod ranking;
mod sorting;

pub use deduplication::{similarity, unique_by_id, DedupOutcome, DedupStats, DuplicateGroup};
pub use fields::{field_value, FieldValue};
pub use filters::{
    filter_schema, AppliedFilters, FilterDefinition, FilterOption, FilterOutcome, FilterSpec,
    FilterStats, FilterType,
};
pub use sorting::{sort_in_place, sort_options, SortOption, SortOptionInfo};

use crate::config::{DedupConfig, RankingConfig};
use crate::model::{Category, EnrichedQuery, UnifiedResult};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct ResultProcessor {
    dedup: DedupConfig,
    ranking: RankingConfig,
}

impl ResultProcessor {
    pub fn new(dedup: DedupConfig, ranking: RankingConfig) -> Self {
        Self { dedup, ranking }
    }

    pub fn deduplicate_results(
        &self,
        results: Vec<UnifiedResult>,
        category: Category,
    ) -> DedupOutcome {
        deduplication::deduplicate(results, self.dedup.threshold(category))
    }

    pub fn rank_results(
        &self,
        results: Vec<UnifiedResult>,
        query: &EnrichedQuery,
    ) -> Vec<UnifiedResult> {
        self.rank_results_at(results, query, Utc::now())
    }

    /// Rank with an explicit clock for freshness scoring
    pub fn rank_results_at(
        &self,
        results: Vec<UnifiedResult>,
        query: &EnrichedQuery,
        now: DateTime<Utc>,
    ) -> Vec<UnifiedResult> {
        ranking::rank(results, query, &self.ranking, now)
    }

    pub fn apply_filters(
        &self,
        results: &[UnifiedResult],
        category: Category,
        applied: &AppliedFilters,
    ) -> FilterOutcome {
        filters::apply_filters(results, category, applied)
    }

    /// Filter definitions for an unfiltered result set
    pub fn filter_definitions(
        &self,
        results: &[UnifiedResult],
        category: Category,
    ) -> Vec<FilterDefinition> {
        filters::apply_filters(results, category, &AppliedFilters::new()).available_filters
    }

    pub fn sort_results(&self, results: Vec<UnifiedResult>, sort_by: &str) -> Vec<UnifiedResult> {
        sorting::sort_results(results, sort_by)
    }

    pub fn sort_options(&self, category: Category) -> Vec<SortOptionInfo> {
        sorting::sort_options(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::model::{FlightDetails, LocationQuery, Price, ProviderRef, ResultDetails, SearchRequest};
    use crate::query::{detect_intent, parse_search_query, synthesize_location};

    fn flight(id: &str, provider: &str, price: f64, number: &str, stops: u32) -> UnifiedResult {
        UnifiedResult::new(
            id,
            ProviderRef::new(provider, provider),
            Price::new(price, "USD"),
            ResultDetails::Flight(FlightDetails {
                flight_numbers: vec![number.to_string()],
                stops,
                ..Default::default()
            }),
        )
    }

    fn enriched() -> EnrichedQuery {
        let req = SearchRequest {
            destination: Some(LocationQuery::new("Lisbon")),
            ..Default::default()
        };
        let query = parse_search_query(&req, &SearchConfig::default()).unwrap();
        let now = Utc::now();
        EnrichedQuery {
            intent: detect_intent(&query, &[], now),
            destination: synthesize_location(&query.destination),
            query,
            origin: None,
            preferences: None,
            intel: None,
            searched_at: now,
            currency: "USD".into(),
        }
    }

    #[test]
    fn test_dedupe_then_rank_pipeline() {
        let processor = ResultProcessor::default();
        let results = vec![
            flight("f1", "sky", 200.0, "TP100", 0),
            flight("f2", "kiwi", 208.0, "TP100", 0),
            flight("f3", "kiwi", 340.0, "TP202", 1),
        ];

        let deduped = processor.deduplicate_results(results, Category::Flights);
        assert_eq!(deduped.unique_results.len(), 2);

        let ranked = processor.rank_results(deduped.unique_results, &enriched());
        assert_eq!(ranked[0].id, "f1");
        assert_eq!(ranked[0].alternatives.len(), 1);
        assert_eq!(ranked[0].ranking.as_ref().unwrap().rank, 1);
        assert_eq!(ranked[1].ranking.as_ref().unwrap().rank, 2);

        let by_price = processor.sort_results(ranked, "price_high");
        assert_eq!(by_price[0].id, "f3");
    }

    #[test]
    fn test_filter_definitions_cover_schema() {
        let processor = ResultProcessor::default();
        let results = vec![flight("f1", "sky", 200.0, "TP100", 0)];

        let defs = processor.filter_definitions(&results, Category::Flights);
        let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["stops", "price", "airlines", "refundable"]);

        assert_eq!(processor.filter_definitions(&[], Category::Hotels).len(), 5);
    }
}
