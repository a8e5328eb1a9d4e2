use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tripsearch::catalog::{DestinationCatalog, InMemoryCatalog, StaticPreferences};
use tripsearch::cli::{Cli, Commands, ConfigAction, SessionCommand};
use tripsearch::config::Config;
use tripsearch::engine::{ActionOutcome, Response, SearchEngine, SearchPayload, SessionAction};
use tripsearch::error::{Result, TripError};
use tripsearch::model::{
    DateRequest, LocationQuery, ResultDetails, SearchOptions, SearchRequest, TravelerRequest,
    UnifiedResult,
};
use tripsearch::providers::FixtureProviders;
use tripsearch::results::AppliedFilters;
use tripsearch::storage::SqliteSessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Config { action } => cmd_config(cli.config, cli.profile, action),
        command => {
            let config = Config::load_or_default(cli.config.as_deref(), cli.profile.as_deref())?;
            let db_path = config.database_path()?;
            let store = SqliteSessionStore::open(&db_path, config.storage.pool_size)?;
            let engine = build_engine(&config, store.clone(), cli.offers.as_deref())?;
            run(command, &engine, &store).await
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "tripsearch=debug"
    } else {
        "tripsearch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn build_engine(
    config: &Config,
    store: SqliteSessionStore,
    offers: Option<&Path>,
) -> Result<SearchEngine> {
    let catalog: Arc<dyn DestinationCatalog> = match &config.catalog.destinations_file {
        Some(path) => Arc::new(InMemoryCatalog::load(path)?),
        None => Arc::new(InMemoryCatalog::bundled()?),
    };
    let providers = match offers {
        Some(path) => FixtureProviders::load(path)?,
        None => FixtureProviders::demo()?,
    };

    Ok(SearchEngine::from_config(
        config,
        catalog,
        Arc::new(StaticPreferences::new()),
        Arc::new(store),
        Arc::new(providers),
    ))
}

async fn run(command: Commands, engine: &SearchEngine, store: &SqliteSessionStore) -> Result<()> {
    match command {
        Commands::Search {
            destination,
            code,
            origin,
            origin_code,
            from,
            to,
            flexible,
            flex_days,
            adults,
            children,
            infants,
            cabin,
            mode,
            currency,
            user,
            json,
        } => {
            let request = SearchRequest {
                destination: Some(location(destination, code)),
                origin: origin.map(|o| location(o, origin_code)),
                dates: Some(DateRequest {
                    start_date: from,
                    end_date: to,
                    flexible,
                    flex_days,
                }),
                travelers: Some(TravelerRequest {
                    adults: Some(adults),
                    children: Some(children),
                    children_ages: Vec::new(),
                    infants: Some(infants),
                }),
                cabin_class: cabin.as_deref().map(parse_wire).transpose()?,
                mode: mode.as_deref().map(parse_wire).transpose()?,
                options: SearchOptions {
                    limit: None,
                    currency,
                },
                user_id: user,
                ..Default::default()
            };

            let response = engine.search(request).await;
            if json {
                print_json(&response)?;
            } else {
                print_search(&response);
            }
            check(&response)
        }
        Commands::Session { token, action } => cmd_session(engine, &token, action).await,
        Commands::Autocomplete { text } => {
            for destination in engine.autocomplete(&text).await? {
                println!(
                    "  {}  {} ({}, {})",
                    destination.code,
                    destination.name,
                    destination.country,
                    wire_name(&destination.location_type)
                );
            }
            Ok(())
        }
        Commands::Trending { limit } => {
            for (i, destination) in engine.get_trending(limit).await?.iter().enumerate() {
                println!(
                    "  {:>2}. {} ({}) popularity {:.0}",
                    i + 1,
                    destination.name,
                    destination.code,
                    destination.popularity
                );
            }
            Ok(())
        }
        Commands::Stats => {
            let db = store.database().clone();
            let stats = tokio::task::spawn_blocking(move || db.stats()).await??;
            println!("Session Store");
            println!("=============");
            println!("  Sessions:       {}", stats.session_count);
            println!("  Completed:      {}", stats.completed_count);
            println!("  Failed:         {}", stats.failed_count);
            println!("  Offers clicked: {}", stats.offers_clicked);
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

async fn cmd_session(engine: &SearchEngine, token: &str, action: SessionCommand) -> Result<()> {
    let (category, action) = match action {
        SessionCommand::Filter { category, filters } => {
            let filters: AppliedFilters = serde_json::from_str(&filters)
                .map_err(|e| TripError::Validation(format!("Invalid filters JSON: {}", e)))?;
            (category, SessionAction::Filter(filters))
        }
        SessionCommand::Sort { category, sort_by } => (category, SessionAction::Sort(sort_by)),
        SessionCommand::Page {
            category,
            page,
            page_size,
        } => (category, SessionAction::Paginate { page, page_size }),
        SessionCommand::Click { offer_id } => {
            engine.track_click(token, &offer_id).await;
            println!("✓ Recorded click on {}", offer_id);
            return Ok(());
        }
        SessionCommand::Save { offer_id } => {
            engine.track_save(token, &offer_id).await;
            println!("✓ Saved {}", offer_id);
            return Ok(());
        }
        SessionCommand::Show => {
            let session = engine
                .session_manager()
                .get_session(token)
                .await?
                .ok_or_else(|| TripError::SessionNotFound {
                    token: token.to_string(),
                })?;
            return print_json(&session);
        }
    };

    let response = engine.continue_session(token, category, action).await;
    match &response.data {
        Some(payload) => match &payload.outcome {
            ActionOutcome::Filter(view) => {
                println!(
                    "{}: {} of {} offers match",
                    category, view.stats.output_count, view.stats.input_count
                );
                print_offers(&view.results);
            }
            ActionOutcome::Sort(sorted) => {
                println!("{}: {} offers re-sorted", category, sorted.total_count);
                print_offers(&sorted.items);
            }
            ActionOutcome::Paginate(page) => {
                println!(
                    "{}: page {}/{} ({} offers)",
                    category,
                    page.page_info.page,
                    page.page_info.total_pages.max(1),
                    page.total_count
                );
                print_offers(&page.items);
            }
        },
        None => print_failure(&response),
    }
    check(&response)
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(config_path.as_deref(), profile.as_deref())?;
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn location(query: String, code: Option<String>) -> LocationQuery {
    let location = LocationQuery::new(query);
    match code {
        Some(code) => location.with_code(code),
        None => location,
    }
}

/// Parse a lowercase wire name into one of the model enums
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|e| TripError::Validation(format!("Invalid value '{}': {}", value, e)))
}

fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| TripError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

fn print_search(response: &Response<SearchPayload>) {
    let Some(data) = &response.data else {
        print_failure(response);
        return;
    };

    println!(
        "✓ Search for {} ({})",
        data.destination.location.name, data.destination.location.code
    );
    println!("  Session: {}", data.session_token);
    println!("  Status:  {}", data.status);
    println!(
        "  Took {}ms ({} live, {} cached)",
        data.meta.search_duration_ms, data.meta.live_calls, data.meta.cache_hits
    );

    for execution in data.meta.providers.iter().filter(|p| !p.success) {
        println!(
            "  ⚠ {} unavailable: {}",
            execution.category,
            execution.error.as_deref().unwrap_or("unknown error")
        );
    }

    for (category, stored) in &data.results {
        println!("\n{} ({} offers)", category, stored.total_count);
        print_offers(&stored.items);
    }

    if !data.suggestions.is_empty() {
        println!();
        for suggestion in &data.suggestions {
            println!("  💡 {}", suggestion.message);
        }
    }
}

fn print_offers(offers: &[UnifiedResult]) {
    for offer in offers.iter().take(10) {
        let rank = offer.ranking.as_ref().map(|r| r.rank).unwrap_or_default();
        let alternatives = match offer.alternatives.len() {
            0 => String::new(),
            n => format!(" (+{} other providers)", n),
        };
        println!(
            "  {:>2}. {:<10} {:<12} {}{}  [{}]",
            rank,
            offer.price.formatted,
            offer.provider.name,
            offer_title(offer),
            alternatives,
            offer.id
        );
    }
}

fn offer_title(offer: &UnifiedResult) -> String {
    match &offer.details {
        ResultDetails::Flight(f) => format!("{} ({} stops)", f.flight_numbers.join("/"), f.stops),
        ResultDetails::Hotel(h) => h.name.clone(),
        ResultDetails::Car(c) => format!("{} ({})", c.vehicle_name, c.vehicle_type),
        ResultDetails::Experience(e) => e.title.clone(),
    }
}

fn print_failure<T>(response: &Response<T>) {
    if let Some(error) = &response.error {
        eprintln!("✗ {} [{}]", error.message, error.code);
    }
}

/// Turn a failure envelope into a non-zero exit
fn check<T>(response: &Response<T>) -> Result<()> {
    match &response.error {
        Some(error) => Err(TripError::Other(anyhow::anyhow!(
            "{}: {}",
            error.code,
            error.message
        ))),
        None => Ok(()),
    }
}
