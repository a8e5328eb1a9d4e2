use std::sync::Arc;
use tempfile::TempDir;
use tripsearch::catalog::{InMemoryCatalog, StaticPreferences};
use tripsearch::config::Config;
use tripsearch::engine::{ActionOutcome, SearchEngine, SessionAction, SEARCH_ERROR};
use tripsearch::model::{
    BudgetLevel, Category, FilterValue, LocationQuery, Scalar, SearchMode, SearchRequest,
    UserPreferences,
};
use tripsearch::providers::{FixtureProviders, ResultSource};
use tripsearch::results::AppliedFilters;
use tripsearch::session::SessionStatus;
use tripsearch::storage::SqliteSessionStore;

struct Harness {
    engine: SearchEngine,
    _dir: TempDir,
}

fn harness(providers: FixtureProviders) -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteSessionStore::open(&dir.path().join("sessions.sqlite"), 4)
        .expect("Failed to open store");
    let preferences = StaticPreferences::new().with_user(
        "traveler-1",
        UserPreferences {
            budget_level: Some(BudgetLevel::MidRange),
            preferred_airlines: vec!["AF".to_string()],
            ..Default::default()
        },
    );

    let engine = SearchEngine::from_config(
        &Config::default(),
        Arc::new(InMemoryCatalog::bundled().expect("bundled catalog")),
        Arc::new(preferences),
        Arc::new(store),
        Arc::new(providers),
    );
    Harness { engine, _dir: dir }
}

fn package_to_paris() -> SearchRequest {
    SearchRequest {
        destination: Some(LocationQuery::new("Paris").with_code("PAR")),
        origin: Some(LocationQuery::new("New York").with_code("NYC")),
        mode: Some(SearchMode::Package),
        user_id: Some("traveler-1".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_package_search_end_to_end() {
    let h = harness(FixtureProviders::demo().expect("demo offers"));

    let response = h.engine.search(package_to_paris()).await;
    assert!(response.success, "search failed: {:?}", response.error);
    let data = response.data.expect("payload");

    assert_eq!(data.status, SessionStatus::Completed);
    assert_eq!(data.results.len(), 4);
    assert!(data.meta.providers.iter().all(|p| p.success));
    assert_eq!(data.meta.live_calls, 4);
    assert_eq!(data.meta.cache_hits, 0);
    assert!(data.query.preferences.is_some());

    for (category, stored) in &data.results {
        let mut ranks: Vec<usize> = stored
            .items
            .iter()
            .map(|r| r.ranking.as_ref().expect("ranked").rank)
            .collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=stored.items.len()).collect::<Vec<_>>(), "{}", category);
        assert!(data.filters.contains_key(category));
        assert!(data.sorts.contains_key(category));
    }

    // The Lumiere listings from both hotel providers merge into one offer
    let hotels = &data.results[&Category::Hotels];
    assert_eq!(hotels.total_count, 4);
    let lumiere = hotels
        .items
        .iter()
        .find(|r| !r.alternatives.is_empty())
        .expect("merged hotel");
    assert_eq!(lumiere.price.amount, 214.0);
    assert_eq!(lumiere.alternatives[0].provider.code, "staywise");
    println!(
        "✓ Session {} with {} hotels",
        data.session_token, hotels.total_count
    );
}

#[tokio::test]
async fn test_continue_session_actions() {
    let h = harness(FixtureProviders::demo().expect("demo offers"));
    let token = h
        .engine
        .search(package_to_paris())
        .await
        .data
        .expect("payload")
        .session_token;

    // Filter: four stars and up
    let mut filters = AppliedFilters::new();
    filters.insert(
        "starRating".to_string(),
        FilterValue::List(vec![Scalar::Number(4.0), Scalar::Number(5.0)]),
    );
    let response = h
        .engine
        .continue_session(&token, Category::Hotels, SessionAction::Filter(filters))
        .await;
    let payload = response.data.expect("filter payload");
    assert!(payload.filters.is_empty());
    assert!(payload.suggestions.is_empty());
    match payload.outcome {
        ActionOutcome::Filter(view) => {
            assert_eq!(view.count, 2);
            assert_eq!(view.stats.input_count, 4);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // Sort: cheapest first, stored order changes
    let response = h
        .engine
        .continue_session(
            &token,
            Category::Hotels,
            SessionAction::Sort("price_low".to_string()),
        )
        .await;
    let sorted = match response.data.expect("sort payload").outcome {
        ActionOutcome::Sort(sorted) => sorted,
        other => panic!("unexpected outcome: {:?}", other),
    };
    let prices: Vec<f64> = sorted.items.iter().map(|r| r.price.amount).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]), "{:?}", prices);

    // Paginate: pages of two walk the sorted list exactly once
    let mut walked = Vec::new();
    for page in 1..=2 {
        let response = h
            .engine
            .continue_session(
                &token,
                Category::Hotels,
                SessionAction::Paginate {
                    page,
                    page_size: Some(2),
                },
            )
            .await;
        match response.data.expect("page payload").outcome {
            ActionOutcome::Paginate(p) => {
                assert_eq!(p.page_info.total_pages, 2);
                assert_eq!(p.page_info.has_more, page == 1);
                walked.extend(p.items.into_iter().map(|r| r.id));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
    let expected: Vec<String> = sorted.items.iter().map(|r| r.id.clone()).collect();
    assert_eq!(walked, expected);

    // Analytics reflect every step
    h.engine.track_click(&token, &expected[0]).await;
    let session = h
        .engine
        .session_manager()
        .get_session(&token)
        .await
        .expect("get")
        .expect("session");
    assert_eq!(session.analytics.filters_applied, 1);
    assert_eq!(session.analytics.sorts_applied, 1);
    assert_eq!(session.analytics.offers_clicked, vec![expected[0].clone()]);
    assert_eq!(session.sort_by.as_deref(), Some("price_low"));
    assert!(session.applied_filters.contains_key(&Category::Hotels));
}

#[tokio::test]
async fn test_partial_failure_keeps_other_categories() {
    let providers = FixtureProviders::demo()
        .expect("demo offers")
        .failing(Category::Cars);
    let h = harness(providers);

    let response = h.engine.search(package_to_paris()).await;
    assert!(response.success);
    let data = response.data.expect("payload");

    let cars = data
        .meta
        .providers
        .iter()
        .find(|p| p.category == Category::Cars)
        .expect("car execution");
    assert!(!cars.success);
    assert!(cars.error.as_deref().unwrap_or_default().contains("unavailable"));

    assert_eq!(data.results[&Category::Cars].total_count, 0);
    assert!(data.results[&Category::Flights].total_count > 0);
    assert!(data.results[&Category::Hotels].total_count > 0);
    assert_eq!(data.meta.live_calls, 3);
    assert_eq!(data.status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_cached_provider_responses_are_counted() {
    let providers = FixtureProviders::demo()
        .expect("demo offers")
        .with_source(ResultSource::Cache);
    let h = harness(providers);

    let mut request = package_to_paris();
    request.mode = Some(SearchMode::Unified);
    let data = h.engine.search(request).await.data.expect("payload");

    // Unified with an origin: flights, hotels, experiences
    assert_eq!(data.meta.providers.len(), 3);
    assert_eq!(data.meta.cache_hits, 3);
    assert_eq!(data.meta.live_calls, 0);
}

#[tokio::test]
async fn test_unknown_session_reports_not_found() {
    let h = harness(FixtureProviders::demo().expect("demo offers"));

    let response = h
        .engine
        .continue_session(
            "no-such-token",
            Category::Hotels,
            SessionAction::Sort("price_low".to_string()),
        )
        .await;
    assert!(!response.success);
    assert_eq!(response.error_code(), Some("SESSION_NOT_FOUND"));

    // Click tracking on an unknown session is a silent no-op
    h.engine.track_click("no-such-token", "offer").await;
}

#[tokio::test]
async fn test_category_not_searched_is_search_error() {
    let h = harness(FixtureProviders::demo().expect("demo offers"));
    let mut request = package_to_paris();
    request.mode = Some(SearchMode::Hotel);
    let token = h
        .engine
        .search(request)
        .await
        .data
        .expect("payload")
        .session_token;

    let response = h
        .engine
        .continue_session(
            &token,
            Category::Cars,
            SessionAction::Paginate {
                page: 1,
                page_size: None,
            },
        )
        .await;
    assert_eq!(response.error_code(), Some(SEARCH_ERROR));
    assert!(response
        .error
        .expect("error")
        .message
        .contains("No results for category: cars"));
}

#[tokio::test]
async fn test_page_number_past_the_end_is_empty() {
    let h = harness(FixtureProviders::demo().expect("demo offers"));
    let token = h
        .engine
        .search(package_to_paris())
        .await
        .data
        .expect("payload")
        .session_token;

    let response = h
        .engine
        .continue_session(
            &token,
            Category::Hotels,
            SessionAction::Paginate {
                page: usize::MAX,
                page_size: Some(2),
            },
        )
        .await;
    match response.data.expect("page payload").outcome {
        ActionOutcome::Paginate(p) => {
            assert!(p.items.is_empty());
            assert!(!p.page_info.has_more);
            assert_eq!(p.total_count, 4);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_sessions_get_distinct_tokens() {
    let h = harness(FixtureProviders::demo().expect("demo offers"));

    let first = h.engine.search(package_to_paris()).await.data.expect("first");
    let second = h.engine.search(package_to_paris()).await.data.expect("second");

    assert_ne!(first.session_token, second.session_token);
    for token in [&first.session_token, &second.session_token] {
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
