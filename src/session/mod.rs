//! Search session management
//!
//! A session is the durable, token-addressable record of one search: its
//! query, per-category results, and the filter, sort and click interactions
//! that follow.

mod manager;

pub use manager::{FilteredView, PaginatedResults, SessionManager};

use crate::model::{Category, EnrichedQuery, UnifiedResult};
use crate::results::AppliedFilters;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, results still being collected
    Pending,
    /// Every requested category has been ingested
    Completed,
    /// Result ingestion could not complete
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            other => Err(format!("unknown session status: {}", other)),
        }
    }
}

/// Pagination metadata for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl PageInfo {
    /// Page metadata for `total` items; `page` is 1-based
    pub fn new(page: usize, page_size: usize, total: usize) -> Self {
        let page_size = page_size.max(1);
        let page = page.max(1);
        let start = (page - 1).saturating_mul(page_size);
        Self {
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
            has_more: start.saturating_add(page_size) < total,
        }
    }

    /// Index of the first item on this page, saturating for huge page numbers
    pub fn start(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Per-provider statistics for one ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub code: String,
    pub response_time_ms: u64,
    pub cache_hit: bool,
    pub result_count: usize,
}

/// Stored results for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResults {
    /// Canonical ranked and deduplicated list
    pub items: Vec<UnifiedResult>,
    pub total_count: usize,
    pub page_info: PageInfo,
    pub providers: Vec<ProviderStats>,
}

/// Lowest and average price of one category at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub lowest_price: f64,
    pub average_price: f64,
}

/// Interaction analytics for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalytics {
    pub search_started: DateTime<Utc>,
    #[serde(default)]
    pub search_completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filters_applied: u32,
    #[serde(default)]
    pub sorts_applied: u32,
    #[serde(default)]
    pub offers_clicked: Vec<String>,
    #[serde(default)]
    pub offers_saved: Vec<String>,
    #[serde(default)]
    pub results_viewed: u32,
}

impl SessionAnalytics {
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            search_started: at,
            search_completed: None,
            filters_applied: 0,
            sorts_applied: 0,
            offers_clicked: Vec::new(),
            offers_saved: Vec::new(),
            results_viewed: 0,
        }
    }
}

/// A search session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSession {
    /// Opaque 32 character token, fixed for the session's lifetime
    pub token: String,

    /// Authenticated user, if any
    #[serde(default)]
    pub user_id: Option<String>,

    /// Generated id for unauthenticated searches
    #[serde(default)]
    pub anonymous_id: Option<String>,

    /// Query the session was created for
    pub query: EnrichedQuery,

    /// Ingested results by category
    #[serde(default)]
    pub results: BTreeMap<Category, CategoryResults>,

    /// Last filters applied per category
    #[serde(default)]
    pub applied_filters: BTreeMap<Category, AppliedFilters>,

    /// Last sort option applied
    #[serde(default)]
    pub sort_by: Option<String>,

    pub status: SessionStatus,

    pub created_at: DateTime<Utc>,

    pub last_activity: DateTime<Utc>,

    #[serde(default)]
    pub price_history: Vec<PriceSnapshot>,

    pub analytics: SessionAnalytics,
}

impl SearchSession {
    /// Record activity at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Whether every requested category has been ingested
    pub fn all_categories_ingested(&self) -> bool {
        self.query
            .query
            .categories
            .iter()
            .all(|c| self.results.contains_key(c))
    }

    /// Distinct provider codes seen across all categories
    pub fn providers_queried(&self) -> Vec<String> {
        self.results
            .values()
            .flat_map(|r| r.providers.iter().map(|p| p.code.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn result_count(&self, category: Category) -> usize {
        self.results
            .get(&category)
            .map(|r| r.total_count)
            .unwrap_or(0)
    }

    /// Whether the session has been idle longer than `ttl_minutes`
    pub fn is_idle(&self, now: DateTime<Utc>, ttl_minutes: i64) -> bool {
        now - self.last_activity > chrono::Duration::minutes(ttl_minutes)
    }
}

/// Outcome of one provider call, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub category: Category,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<UnifiedResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub cache_hit: bool,
}

impl ExecutionResult {
    pub fn succeeded(
        category: Category,
        results: Vec<UnifiedResult>,
        response_time_ms: u64,
        cache_hit: bool,
    ) -> Self {
        Self {
            category,
            success: true,
            results,
            error: None,
            response_time_ms,
            cache_hit,
        }
    }

    pub fn failed(category: Category, error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            category,
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
            response_time_ms,
            cache_hit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(1, 50, 120);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_more);

        let last = PageInfo::new(3, 50, 120);
        assert!(!last.has_more);

        let empty = PageInfo::new(1, 50, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);

        // Page 0 clamps to the first page
        assert_eq!(PageInfo::new(0, 10, 5).page, 1);

        let far = PageInfo::new(usize::MAX, 2, 5);
        assert!(!far.has_more);
        assert_eq!(far.start(), usize::MAX);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!("stopped".parse::<SessionStatus>().is_err());
    }
}
