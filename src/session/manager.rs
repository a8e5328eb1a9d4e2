//! Session lifecycle and two-tier persistence
//!
//! Sessions live in a bounded in-process LRU cache in front of a durable
//! [`SessionStore`]. Every mutation re-serializes the whole session and
//! upserts it; concurrent writers to one token race, and the last write wins.

use super::{
    CategoryResults, ExecutionResult, PageInfo, PriceSnapshot, ProviderStats, SearchSession,
    SessionAnalytics, SessionStatus,
};
use crate::config::SessionConfig;
use crate::error::{Result, TripError};
use crate::model::{Category, EnrichedQuery, UnifiedResult};
use crate::results::{
    sort_in_place, unique_by_id, AppliedFilters, FilterDefinition, FilterStats, ResultProcessor,
};
use crate::storage::SessionStore;
use chrono::{DateTime, Utc};
use lru::LruCache;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

const TOKEN_LEN: usize = 32;
const ANON_SUFFIX_LEN: usize = 9;
const ANON_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Filtered view over a category's stored results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredView {
    pub category: Category,
    pub results: Vec<UnifiedResult>,
    pub count: usize,
    pub available_filters: Vec<FilterDefinition>,
    pub applied_filters: AppliedFilters,
    pub stats: FilterStats,
}

/// One page of a category's stored results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResults {
    pub category: Category,
    pub items: Vec<UnifiedResult>,
    pub total_count: usize,
    pub page_info: PageInfo,
}

pub struct SessionManager {
    processor: ResultProcessor,
    store: Arc<dyn SessionStore>,
    cache: Mutex<LruCache<String, SearchSession>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        processor: ResultProcessor,
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            processor,
            store,
            cache: Mutex::new(LruCache::new(capacity)),
            config,
        }
    }

    /// Start a new session for an enriched query
    pub async fn create_session(
        &self,
        query: EnrichedQuery,
        user_id: Option<&str>,
    ) -> Result<SearchSession> {
        let now = Utc::now();
        let anonymous_id = match user_id {
            Some(_) => None,
            None => Some(anonymous_id(now)),
        };

        let session = SearchSession {
            token: generate_token(),
            user_id: user_id.map(str::to_string),
            anonymous_id,
            query,
            results: Default::default(),
            applied_filters: Default::default(),
            sort_by: None,
            status: SessionStatus::Pending,
            created_at: now,
            last_activity: now,
            price_history: Vec::new(),
            analytics: SessionAnalytics::started(now),
        };

        self.save(&session).await?;
        tracing::info!(
            "Created session {} for {}",
            session.token,
            session.query.destination.name
        );
        Ok(session)
    }

    /// Look a session up in the cache, then in the store
    pub async fn get_session(&self, token: &str) -> Result<Option<SearchSession>> {
        if let Some(session) = self.cache.lock().await.get(token) {
            return Ok(Some(session.clone()));
        }

        let loaded = self.store.get(token).await?;
        if let Some(session) = &loaded {
            tracing::debug!("Loaded session {} from store", token);
            self.cache
                .lock()
                .await
                .put(session.token.clone(), session.clone());
        }
        Ok(loaded)
    }

    async fn require_session(&self, token: &str) -> Result<SearchSession> {
        self.get_session(token)
            .await?
            .ok_or_else(|| TripError::SessionNotFound {
                token: token.to_string(),
            })
    }

    /// Write through to the store, then refresh the cache
    async fn save(&self, session: &SearchSession) -> Result<()> {
        self.store.upsert(session).await?;
        self.cache
            .lock()
            .await
            .put(session.token.clone(), session.clone());
        Ok(())
    }

    /// Ingest one category's provider executions
    ///
    /// Unsuccessful executions are skipped. Results are made id-unique,
    /// deduplicated across providers, then ranked against the session query.
    pub async fn update_session_results(
        &self,
        token: &str,
        category: Category,
        executions: &[ExecutionResult],
    ) -> Result<SearchSession> {
        let mut session = self.require_session(token).await?;
        let now = Utc::now();

        let mut providers: Vec<ProviderStats> = Vec::new();
        let mut collected: Vec<UnifiedResult> = Vec::new();

        for execution in executions.iter().filter(|e| e.success) {
            for result in &execution.results {
                match providers
                    .iter_mut()
                    .find(|p| p.code == result.provider.code)
                {
                    Some(stats) => stats.result_count += 1,
                    None => providers.push(ProviderStats {
                        code: result.provider.code.clone(),
                        response_time_ms: execution.response_time_ms,
                        cache_hit: execution.cache_hit,
                        result_count: 1,
                    }),
                }
            }
            collected.extend(execution.results.iter().cloned());
        }

        let unique = unique_by_id(collected);
        let deduped = self.processor.deduplicate_results(unique, category);
        let ranked = self
            .processor
            .rank_results_at(deduped.unique_results, &session.query, now);

        if let Some(first) = ranked.first() {
            let average = ranked.iter().map(|r| r.price.amount).sum::<f64>() / ranked.len() as f64;
            session.price_history.push(PriceSnapshot {
                timestamp: now,
                category,
                lowest_price: first.price.amount,
                average_price: average,
            });
        }

        let total_count = ranked.len();
        session.results.insert(
            category,
            CategoryResults {
                items: ranked,
                total_count,
                page_info: PageInfo::new(1, self.config.page_size, total_count),
                providers,
            },
        );

        if session.status == SessionStatus::Pending && session.all_categories_ingested() {
            session.status = SessionStatus::Completed;
            session.analytics.search_completed = Some(now);
        }
        session.touch(now);

        self.save(&session).await?;
        tracing::info!(
            "Session {}: stored {} {} ({} duplicates merged)",
            token,
            total_count,
            category,
            deduped.stats.duplicates_removed
        );
        Ok(session)
    }

    /// Mark a session whose ingestion could not complete
    pub async fn mark_failed(&self, token: &str, reason: &str) -> Result<()> {
        let mut session = self.require_session(token).await?;
        session.status = SessionStatus::Failed;
        session.touch(Utc::now());
        self.save(&session).await?;
        tracing::warn!("Session {} failed: {}", token, reason);
        Ok(())
    }

    /// Filter a category's stored results without changing them
    pub async fn apply_session_filters(
        &self,
        token: &str,
        category: Category,
        filters: AppliedFilters,
    ) -> Result<FilteredView> {
        let mut session = self.require_session(token).await?;
        let stored = session
            .results
            .get(&category)
            .ok_or(TripError::NoResults { category })?;

        let outcome = self
            .processor
            .apply_filters(&stored.items, category, &filters);

        session.applied_filters.insert(category, filters);
        session.analytics.filters_applied += 1;
        session.touch(Utc::now());
        self.save(&session).await?;

        Ok(FilteredView {
            category,
            count: outcome.filtered_results.len(),
            results: outcome.filtered_results,
            available_filters: outcome.available_filters,
            applied_filters: outcome.applied_filters,
            stats: outcome.stats,
        })
    }

    /// Reorder a category's stored results in place
    pub async fn apply_session_sort(
        &self,
        token: &str,
        category: Category,
        sort_by: &str,
    ) -> Result<CategoryResults> {
        let mut session = self.require_session(token).await?;
        let stored = session
            .results
            .get_mut(&category)
            .ok_or(TripError::NoResults { category })?;

        sort_in_place(&mut stored.items, sort_by);
        let sorted = stored.clone();

        session.sort_by = Some(sort_by.to_string());
        session.analytics.sorts_applied += 1;
        session.touch(Utc::now());
        self.save(&session).await?;

        Ok(sorted)
    }

    /// Record an offer click; failures are logged and ignored
    pub async fn track_offer_click(&self, token: &str, offer_id: &str) {
        self.track(token, "click", |session| {
            session.analytics.offers_clicked.push(offer_id.to_string());
            session.analytics.results_viewed += 1;
        })
        .await
    }

    /// Record a saved offer; failures are logged and ignored
    pub async fn track_offer_save(&self, token: &str, offer_id: &str) {
        self.track(token, "save", |session| {
            session.analytics.offers_saved.push(offer_id.to_string());
        })
        .await
    }

    async fn track(&self, token: &str, what: &str, apply: impl FnOnce(&mut SearchSession)) {
        let mut session = match self.get_session(token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("Ignoring {} for unknown session {}", what, token);
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to load session {} for {}: {}", token, what, e);
                return;
            }
        };

        apply(&mut session);
        session.touch(Utc::now());

        if let Err(e) = self.save(&session).await {
            tracing::warn!("Failed to record {} for session {}: {}", what, token, e);
        }
    }

    /// Slice of a category's canonical list; pages are 1-based
    pub async fn get_paginated_results(
        &self,
        token: &str,
        category: Category,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<PaginatedResults> {
        let session = self.require_session(token).await?;
        let stored = session
            .results
            .get(&category)
            .ok_or(TripError::NoResults { category })?;

        let size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(self.config.page_size);
        let page_info = PageInfo::new(page, size, stored.items.len());

        let start = page_info.start();
        let items = stored
            .items
            .iter()
            .skip(start)
            .take(page_info.page_size)
            .cloned()
            .collect();

        Ok(PaginatedResults {
            category,
            items,
            total_count: stored.items.len(),
            page_info,
        })
    }

    /// Evict cache entries idle past the configured TTL
    pub async fn clear_expired_cache(&self) -> usize {
        self.clear_expired_cache_at(Utc::now()).await
    }

    pub async fn clear_expired_cache_at(&self, now: DateTime<Utc>) -> usize {
        let mut cache = self.cache.lock().await;
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, session)| session.is_idle(now, self.config.cache_ttl_minutes))
            .map(|(token, _)| token.clone())
            .collect();

        for token in &expired {
            cache.pop(token);
        }

        if !expired.is_empty() {
            tracing::info!("Evicted {} idle sessions from cache", expired.len());
        }
        expired.len()
    }

    /// Number of sessions currently cached
    pub async fn cached_sessions(&self) -> usize {
        self.cache.lock().await.len()
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn anonymous_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ANON_SUFFIX_LEN)
        .map(|_| ANON_CHARSET[rng.gen_range(0..ANON_CHARSET.len())] as char)
        .collect();
    format!("anon_{}_{}", now.timestamp_millis(), suffix)
}
