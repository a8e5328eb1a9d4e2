use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use tripsearch::catalog::{InMemoryCatalog, StaticPreferences};
use tripsearch::config::{Config, SearchConfig};
use tripsearch::model::{Category, EnrichedQuery, LocationQuery, SearchMode, SearchRequest};
use tripsearch::providers::{search_category, FixtureProviders};
use tripsearch::query::QueryProcessor;
use tripsearch::results::ResultProcessor;
use tripsearch::session::{ExecutionResult, SessionManager, SessionStatus};
use tripsearch::storage::SqliteSessionStore;

async fn paris_query() -> EnrichedQuery {
    let processor = QueryProcessor::new(
        Arc::new(InMemoryCatalog::bundled().expect("bundled catalog")),
        Arc::new(StaticPreferences::new()),
        SearchConfig::default(),
    );
    let request = SearchRequest {
        destination: Some(LocationQuery::new("Paris").with_code("PAR")),
        mode: Some(SearchMode::Hotel),
        ..Default::default()
    };
    let query = processor.parse(&request).expect("valid request");
    processor.enrich(query, None).await
}

fn manager(store: SqliteSessionStore) -> SessionManager {
    let config = Config::default();
    SessionManager::new(
        ResultProcessor::new(config.dedup, config.ranking),
        Arc::new(store),
        config.session,
    )
}

async fn hotel_executions(query: &EnrichedQuery) -> Vec<ExecutionResult> {
    let providers = FixtureProviders::demo().expect("demo offers");
    let response = search_category(&providers, Category::Hotels, query)
        .await
        .expect("hotel search");
    vec![ExecutionResult::succeeded(
        Category::Hotels,
        response.results,
        15,
        false,
    )]
}

#[tokio::test]
async fn test_sqlite_round_trip() {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("sessions.sqlite");
    let store = SqliteSessionStore::open(&db_path, 2).expect("Failed to open store");
    let sessions = manager(store.clone());

    let query = paris_query().await;
    let created = sessions
        .create_session(query.clone(), None)
        .await
        .expect("Failed to create session");
    let executions = hotel_executions(&query).await;
    let updated = sessions
        .update_session_results(&created.token, Category::Hotels, &executions)
        .await
        .expect("Failed to ingest hotels");
    assert_eq!(updated.status, SessionStatus::Completed);
    println!(
        "✓ Session {} ingested {} hotels",
        updated.token,
        updated.result_count(Category::Hotels)
    );

    // Two upserts of the same token, one row
    let stats = store.database().stats().expect("stats");
    assert_eq!(stats.session_count, 1);
    assert_eq!(stats.completed_count, 1);

    // A fresh store over the same file sees the last write
    let reopened = SqliteSessionStore::open(&db_path, 2).expect("Failed to reopen store");
    let loaded = reopened
        .database()
        .load_session(&created.token)
        .expect("load")
        .expect("session should be stored");

    assert_eq!(loaded.token, updated.token);
    assert_eq!(loaded.status, SessionStatus::Completed);
    assert_eq!(loaded.anonymous_id, updated.anonymous_id);
    assert_eq!(
        loaded.analytics.search_completed,
        updated.analytics.search_completed
    );
    let ids = |s: &tripsearch::session::SearchSession| -> Vec<String> {
        s.results[&Category::Hotels]
            .items
            .iter()
            .map(|r| r.id.clone())
            .collect()
    };
    assert_eq!(ids(&loaded), ids(&updated));
    assert_eq!(loaded.price_history.len(), 1);

    let conn = reopened.database().get_conn().expect("connection");
    let (destination, hotel_count, status): (String, i64, String) = conn
        .query_row(
            "SELECT destination_code, hotel_count, status FROM search_sessions WHERE token = ?1",
            [&created.token],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("flattened row");
    assert_eq!(destination, "PAR");
    assert_eq!(hotel_count as usize, updated.result_count(Category::Hotels));
    assert_eq!(status, "completed");
}

#[tokio::test]
async fn test_evicted_sessions_reload_from_store() {
    let temp_dir = TempDir::new().expect("temp dir");
    let store =
        SqliteSessionStore::open(&temp_dir.path().join("sessions.sqlite"), 2).expect("store");
    let sessions = manager(store);

    let session = sessions
        .create_session(paris_query().await, Some("traveler-7"))
        .await
        .expect("create");
    assert_eq!(sessions.cached_sessions().await, 1);

    // Still fresh: nothing to evict
    assert_eq!(sessions.clear_expired_cache().await, 0);

    let later = Utc::now() + Duration::minutes(31);
    assert_eq!(sessions.clear_expired_cache_at(later).await, 1);
    assert_eq!(sessions.cached_sessions().await, 0);

    let reloaded = sessions
        .get_session(&session.token)
        .await
        .expect("get")
        .expect("session should load from the store");
    assert_eq!(reloaded.user_id.as_deref(), Some("traveler-7"));
    assert!(reloaded.anonymous_id.is_none());
    assert_eq!(sessions.cached_sessions().await, 1);
}

#[tokio::test]
async fn test_tracking_persists() {
    let temp_dir = TempDir::new().expect("temp dir");
    let store =
        SqliteSessionStore::open(&temp_dir.path().join("sessions.sqlite"), 2).expect("store");
    let sessions = manager(store.clone());

    let session = sessions
        .create_session(paris_query().await, None)
        .await
        .expect("create");
    sessions.track_offer_click(&session.token, "offer-1").await;
    sessions.track_offer_save(&session.token, "offer-2").await;
    // Unknown tokens are ignored
    sessions.track_offer_click("missing", "offer-3").await;

    let stored = store
        .database()
        .load_session(&session.token)
        .expect("load")
        .expect("stored");
    assert_eq!(stored.analytics.offers_clicked, vec!["offer-1".to_string()]);
    assert_eq!(stored.analytics.offers_saved, vec!["offer-2".to_string()]);
    assert_eq!(stored.analytics.results_viewed, 1);
    assert_eq!(store.database().stats().expect("stats").offers_clicked, 1);
}
