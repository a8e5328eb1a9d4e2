//! Response envelope and payloads returned to the UI layer

use super::suggestions::Suggestion;
use crate::error::TripError;
use crate::model::{Category, DestinationIntel, EnrichedQuery, ResolvedLocation};
use crate::results::{FilterDefinition, SortOptionInfo};
use crate::session::{
    CategoryResults, ExecutionResult, FilteredView, PaginatedResults, SessionStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error code used for any failure inside `search`
pub const SEARCH_ERROR: &str = "SEARCH_ERROR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// Success or failure envelope; exactly one of `data` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorInfo {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// Failure carrying the error's own code
    pub fn from_error(err: &TripError) -> Self {
        Self::failure(err.code(), err.to_string())
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

pub type SearchResponse = Response<SearchPayload>;
pub type SessionResponse = Response<SessionPayload>;

/// Resolved destination plus whatever the catalog knows about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationInfo {
    pub location: ResolvedLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intel: Option<DestinationIntel>,
}

/// One settled provider call as reported in `meta.providers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderExecution {
    pub category: Category,
    pub success: bool,
    pub response_time_ms: u64,
    pub result_count: usize,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ExecutionResult> for ProviderExecution {
    fn from(execution: &ExecutionResult) -> Self {
        Self {
            category: execution.category,
            success: execution.success,
            response_time_ms: execution.response_time_ms,
            result_count: execution.results.len(),
            cache_hit: execution.cache_hit,
            error: execution.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub search_duration_ms: u64,
    pub providers: Vec<ProviderExecution>,
    /// Successful calls answered from a provider cache
    pub cache_hits: usize,
    /// Successful calls answered live
    pub live_calls: usize,
}

impl SearchMeta {
    pub fn new(search_duration_ms: u64, executions: &[ExecutionResult]) -> Self {
        let succeeded = executions.iter().filter(|e| e.success);
        let cache_hits = succeeded.clone().filter(|e| e.cache_hit).count();
        let live_calls = succeeded.count() - cache_hits;

        Self {
            search_duration_ms,
            providers: executions.iter().map(ProviderExecution::from).collect(),
            cache_hits,
            live_calls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub session_token: String,
    pub status: SessionStatus,
    pub results: BTreeMap<Category, CategoryResults>,
    pub query: EnrichedQuery,
    pub filters: BTreeMap<Category, Vec<FilterDefinition>>,
    pub sorts: BTreeMap<Category, Vec<SortOptionInfo>>,
    pub suggestions: Vec<Suggestion>,
    pub destination: DestinationInfo,
    pub meta: SearchMeta,
}

/// Outcome of a follow-up action on a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ActionOutcome {
    Filter(FilteredView),
    Sort(CategoryResults),
    Paginate(PaginatedResults),
}

/// Payload for `continue_session`; filters, sorts and suggestions are only
/// computed on the initial search and stay empty here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub session_token: String,
    pub category: Category,
    pub outcome: ActionOutcome,
    pub filters: BTreeMap<Category, Vec<FilterDefinition>>,
    pub sorts: BTreeMap<Category, Vec<SortOptionInfo>>,
    pub suggestions: Vec<Suggestion>,
}

impl SessionPayload {
    pub fn new(
        session_token: impl Into<String>,
        category: Category,
        outcome: ActionOutcome,
    ) -> Self {
        Self {
            session_token: session_token.into(),
            category,
            outcome,
            filters: BTreeMap::new(),
            sorts: BTreeMap::new(),
            suggestions: Vec::new(),
        }
    }
}
