//! Search orchestration
//!
//! [`SearchEngine`] drives one search end to end: parse, enrich, open a
//! session, fan out to every target category concurrently, ingest what comes
//! back, and assemble the response. Failures never escape `search` or
//! `continue_session`; they come back as failure envelopes.

mod response;
mod suggestions;

pub use response::{
    ActionOutcome, DestinationInfo, ErrorInfo, ProviderExecution, Response, SearchMeta,
    SearchPayload, SearchResponse, SessionPayload, SessionResponse, SEARCH_ERROR,
};
pub use suggestions::{suggestions_for, Suggestion, SuggestionKind};

use crate::catalog::{Destination, DestinationCatalog, PreferenceStore};
use crate::config::{Config, SearchConfig};
use crate::error::{Result, TripError};
use crate::model::{Category, EnrichedQuery, SearchRequest};
use crate::providers::{search_category, ProviderManager, ResultSource};
use crate::query::QueryProcessor;
use crate::results::{AppliedFilters, ResultProcessor};
use crate::session::{ExecutionResult, SearchSession, SessionManager};
use crate::storage::SessionStore;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Follow-up operation on an existing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "lowercase")]
pub enum SessionAction {
    Filter(AppliedFilters),
    Sort(String),
    Paginate {
        page: usize,
        #[serde(default, rename = "pageSize")]
        page_size: Option<usize>,
    },
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::Filter(_) => "filter",
            SessionAction::Sort(_) => "sort",
            SessionAction::Paginate { .. } => "paginate",
        }
    }
}

pub struct SearchEngine {
    query_processor: QueryProcessor,
    session_manager: Arc<SessionManager>,
    result_processor: ResultProcessor,
    providers: Arc<dyn ProviderManager>,
    catalog: Arc<dyn DestinationCatalog>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        query_processor: QueryProcessor,
        session_manager: Arc<SessionManager>,
        result_processor: ResultProcessor,
        providers: Arc<dyn ProviderManager>,
        catalog: Arc<dyn DestinationCatalog>,
        config: SearchConfig,
    ) -> Self {
        Self {
            query_processor,
            session_manager,
            result_processor,
            providers,
            catalog,
            config,
        }
    }

    /// Wire every component from one configuration
    pub fn from_config(
        config: &Config,
        catalog: Arc<dyn DestinationCatalog>,
        preferences: Arc<dyn PreferenceStore>,
        store: Arc<dyn SessionStore>,
        providers: Arc<dyn ProviderManager>,
    ) -> Self {
        let result_processor = ResultProcessor::new(config.dedup.clone(), config.ranking.clone());
        let session_manager = Arc::new(SessionManager::new(
            result_processor.clone(),
            store,
            config.session.clone(),
        ));
        let query_processor =
            QueryProcessor::new(catalog.clone(), preferences, config.search.clone());

        Self::new(
            query_processor,
            session_manager,
            result_processor,
            providers,
            catalog,
            config.search.clone(),
        )
    }

    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session_manager
    }

    /// Run a full search; never fails, errors become a `SEARCH_ERROR` envelope
    pub async fn search(&self, request: SearchRequest) -> SearchResponse {
        let started = Instant::now();
        match self.run_search(&request, started).await {
            Ok(payload) => {
                tracing::info!(
                    "Search {} finished in {}ms",
                    payload.session_token,
                    payload.meta.search_duration_ms
                );
                Response::ok(payload)
            }
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                Response::failure(SEARCH_ERROR, e.to_string())
            }
        }
    }

    async fn run_search(&self, request: &SearchRequest, started: Instant) -> Result<SearchPayload> {
        let query = self.query_processor.parse(request)?;
        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let enriched = self.query_processor.enrich(query, user_id).await;
        let enriched = self.query_processor.optimize(enriched);
        let session = self
            .session_manager
            .create_session(enriched, user_id)
            .await?;
        let token = session.token.clone();

        let executions = self
            .fetch_all(&session.query, &session.query.query.categories)
            .await;

        for execution in &executions {
            let ingested = self
                .session_manager
                .update_session_results(
                    &token,
                    execution.category,
                    std::slice::from_ref(execution),
                )
                .await;
            if let Err(e) = ingested {
                if let Err(mark) = self.session_manager.mark_failed(&token, &e.to_string()).await {
                    tracing::warn!("Could not mark session {} failed: {}", token, mark);
                }
                return Err(e);
            }
        }

        let session = self
            .session_manager
            .get_session(&token)
            .await?
            .ok_or(TripError::SessionNotFound { token })?;

        Ok(self.build_payload(session, &executions, started.elapsed()))
    }

    /// Query every category concurrently and wait for all of them to settle
    async fn fetch_all(
        &self,
        query: &EnrichedQuery,
        categories: &[Category],
    ) -> Vec<ExecutionResult> {
        let calls = categories
            .iter()
            .map(|&category| self.fetch_category(query, category));
        join_all(calls).await
    }

    async fn fetch_category(&self, query: &EnrichedQuery, category: Category) -> ExecutionResult {
        let started = Instant::now();
        let outcome = search_category(self.providers.as_ref(), category, query).await;
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                tracing::debug!(
                    "{}: {} offers in {}ms ({:?})",
                    category,
                    response.results.len(),
                    elapsed,
                    response.source
                );
                ExecutionResult::succeeded(
                    category,
                    response.results,
                    elapsed,
                    response.source == ResultSource::Cache,
                )
            }
            Err(e) => {
                let error = TripError::Provider {
                    category,
                    message: format!("{:#}", e),
                };
                tracing::warn!("{} after {}ms", error, elapsed);
                ExecutionResult::failed(category, error.to_string(), elapsed)
            }
        }
    }

    fn build_payload(
        &self,
        session: SearchSession,
        executions: &[ExecutionResult],
        elapsed: Duration,
    ) -> SearchPayload {
        let mut filters = BTreeMap::new();
        let mut sorts = BTreeMap::new();
        for (category, stored) in &session.results {
            filters.insert(
                *category,
                self.result_processor
                    .filter_definitions(&stored.items, *category),
            );
            sorts.insert(*category, self.result_processor.sort_options(*category));
        }

        let suggestions = suggestions_for(&session.query);
        let destination = DestinationInfo {
            location: session.query.destination.clone(),
            intel: session.query.intel.clone(),
        };

        SearchPayload {
            session_token: session.token,
            status: session.status,
            results: session.results,
            query: session.query,
            filters,
            sorts,
            suggestions,
            destination,
            meta: SearchMeta::new(elapsed.as_millis() as u64, executions),
        }
    }

    /// Filter, sort or page an existing session
    ///
    /// An unknown token reports `SESSION_NOT_FOUND`; anything else that goes
    /// wrong reports `SEARCH_ERROR`.
    pub async fn continue_session(
        &self,
        token: &str,
        category: Category,
        action: SessionAction,
    ) -> SessionResponse {
        let name = action.name();
        match self.run_action(token, category, action).await {
            Ok(outcome) => Response::ok(SessionPayload::new(token, category, outcome)),
            Err(e @ TripError::SessionNotFound { .. }) => {
                tracing::debug!("{} on unknown session {}", name, token);
                Response::from_error(&e)
            }
            Err(e) => {
                tracing::warn!("{} on session {} failed: {}", name, token, e);
                Response::failure(SEARCH_ERROR, e.to_string())
            }
        }
    }

    async fn run_action(
        &self,
        token: &str,
        category: Category,
        action: SessionAction,
    ) -> Result<ActionOutcome> {
        let manager = &self.session_manager;
        Ok(match action {
            SessionAction::Filter(filters) => ActionOutcome::Filter(
                manager
                    .apply_session_filters(token, category, filters)
                    .await?,
            ),
            SessionAction::Sort(sort_by) => {
                ActionOutcome::Sort(manager.apply_session_sort(token, category, &sort_by).await?)
            }
            SessionAction::Paginate { page, page_size } => ActionOutcome::Paginate(
                manager
                    .get_paginated_results(token, category, page, page_size)
                    .await?,
            ),
        })
    }

    /// Destinations matching typed text
    ///
    /// Exact code matches come first, then name-prefix matches, each group
    /// keeping catalog popularity order.
    pub async fn autocomplete(&self, text: &str) -> Result<Vec<Destination>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = self.catalog.search(&needle, usize::MAX).await?;
        matches.sort_by_key(|d| {
            if d.code.to_lowercase() == needle {
                0
            } else if d.name.to_lowercase().starts_with(&needle) {
                1
            } else {
                2
            }
        });
        matches.truncate(self.config.autocomplete_limit);
        Ok(matches)
    }

    pub async fn get_trending(&self, limit: Option<usize>) -> Result<Vec<Destination>> {
        self.catalog
            .trending(limit.unwrap_or(self.config.trending_limit))
            .await
    }

    pub async fn track_click(&self, token: &str, offer_id: &str) {
        self.session_manager.track_offer_click(token, offer_id).await
    }

    pub async fn track_save(&self, token: &str, offer_id: &str) {
        self.session_manager.track_offer_save(token, offer_id).await
    }
}
