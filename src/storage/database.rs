//! SQLite session storage with migrations
//!
//! Each session is one row keyed by token: flattened query, result and
//! analytics columns for inspection, plus the full JSON snapshot that is
//! read back on load.

use super::SessionStore;
use crate::error::{Result, TripError};
use crate::model::Category;
use crate::session::SearchSession;
use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

/// Database manager with migration support
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database file and bring the schema up to date
    pub fn new(db_path: &Path, pool_size: u32) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TripError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let db = Self { pool };
        db.migrate()?;

        tracing::debug!("Opened session database at {}", db_path.display());
        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Write a session row, replacing any previous row for the token
    pub fn upsert_session(&self, session: &SearchSession) -> Result<()> {
        let row = SessionRow::from_session(session)?;
        let conn = self.get_conn()?;

        conn.execute(
            UPSERT_SESSION,
            params![
                row.token,
                row.user_id,
                row.anonymous_id,
                row.destination_code,
                row.origin_code,
                row.mode,
                row.start_date,
                row.end_date,
                row.adults,
                row.children,
                row.infants,
                row.cabin_class,
                row.flight_count,
                row.hotel_count,
                row.car_count,
                row.experience_count,
                row.providers_queried,
                row.status,
                row.applied_filters,
                row.sort_by,
                row.search_started,
                row.search_completed,
                row.filters_applied,
                row.sorts_applied,
                row.offers_clicked,
                row.offers_saved,
                row.results_viewed,
                row.created_at,
                row.last_activity,
                row.snapshot,
            ],
        )?;

        Ok(())
    }

    /// Load a session snapshot by token
    pub fn load_session(&self, token: &str) -> Result<Option<SearchSession>> {
        let conn = self.get_conn()?;

        let snapshot: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM search_sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;

        snapshot
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| TripError::json(e, format!("Corrupt session snapshot: {}", token)))
            })
            .transpose()
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let session_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM search_sessions", [], |row| row.get(0))?;

        let completed_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM search_sessions WHERE status = 'completed'",
            [],
            |row| row.get(0),
        )?;

        let failed_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM search_sessions WHERE status = 'failed'",
            [],
            |row| row.get(0),
        )?;

        let offers_clicked: i64 = conn.query_row(
            "SELECT COALESCE(SUM(offers_clicked), 0) FROM search_sessions",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            session_count: session_count as usize,
            completed_count: completed_count as usize,
            failed_count: failed_count as usize,
            offers_clicked: offers_clicked as usize,
        })
    }
}

/// Database statistics
#[derive(Debug)]
pub struct DbStats {
    pub session_count: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub offers_clicked: usize,
}

/// Flattened column values for one session
struct SessionRow {
    token: String,
    user_id: Option<String>,
    anonymous_id: Option<String>,
    destination_code: String,
    origin_code: Option<String>,
    mode: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    adults: u32,
    children: u32,
    infants: u32,
    cabin_class: Option<String>,
    flight_count: i64,
    hotel_count: i64,
    car_count: i64,
    experience_count: i64,
    providers_queried: String,
    status: &'static str,
    applied_filters: String,
    sort_by: Option<String>,
    search_started: i64,
    search_completed: Option<i64>,
    filters_applied: u32,
    sorts_applied: u32,
    offers_clicked: i64,
    offers_saved: i64,
    results_viewed: u32,
    created_at: i64,
    last_activity: i64,
    snapshot: String,
}

impl SessionRow {
    fn from_session(session: &SearchSession) -> Result<Self> {
        let query = &session.query;

        Ok(Self {
            token: session.token.clone(),
            user_id: session.user_id.clone(),
            anonymous_id: session.anonymous_id.clone(),
            destination_code: query.destination.code.clone(),
            origin_code: query.origin.as_ref().map(|o| o.code.clone()),
            mode: query.query.mode.and_then(wire_name),
            start_date: query.query.dates.start_date.map(|d| d.to_string()),
            end_date: query.query.dates.end_date.map(|d| d.to_string()),
            adults: query.query.travelers.adults,
            children: query.query.travelers.children,
            infants: query.query.travelers.infants,
            cabin_class: query.query.travelers.cabin_class.and_then(wire_name),
            flight_count: session.result_count(Category::Flights) as i64,
            hotel_count: session.result_count(Category::Hotels) as i64,
            car_count: session.result_count(Category::Cars) as i64,
            experience_count: session.result_count(Category::Experiences) as i64,
            providers_queried: to_json(&session.providers_queried(), "providers")?,
            status: session.status.as_str(),
            applied_filters: to_json(&session.applied_filters, "applied filters")?,
            sort_by: session.sort_by.clone(),
            search_started: session.analytics.search_started.timestamp_millis(),
            search_completed: session
                .analytics
                .search_completed
                .map(|t| t.timestamp_millis()),
            filters_applied: session.analytics.filters_applied,
            sorts_applied: session.analytics.sorts_applied,
            offers_clicked: session.analytics.offers_clicked.len() as i64,
            offers_saved: session.analytics.offers_saved.len() as i64,
            results_viewed: session.analytics.results_viewed,
            created_at: session.created_at.timestamp_millis(),
            last_activity: session.last_activity.timestamp_millis(),
            snapshot: to_json(session, "session snapshot")?,
        })
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| TripError::json(e, format!("Failed to serialize {}", what)))
}

/// Serialized name of a unit enum variant, e.g. `premium_economy`
fn wire_name<T: Serialize>(value: T) -> Option<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
}

const UPSERT_SESSION: &str = "
    INSERT INTO search_sessions (
        token, user_id, anonymous_id, destination_code, origin_code, mode,
        start_date, end_date, adults, children, infants, cabin_class,
        flight_count, hotel_count, car_count, experience_count,
        providers_queried, status, applied_filters, sort_by,
        search_started, search_completed, filters_applied, sorts_applied,
        offers_clicked, offers_saved, results_viewed,
        created_at, last_activity, snapshot
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
        ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30
    )
    ON CONFLICT(token) DO UPDATE SET
        user_id = excluded.user_id,
        anonymous_id = excluded.anonymous_id,
        destination_code = excluded.destination_code,
        origin_code = excluded.origin_code,
        mode = excluded.mode,
        start_date = excluded.start_date,
        end_date = excluded.end_date,
        adults = excluded.adults,
        children = excluded.children,
        infants = excluded.infants,
        cabin_class = excluded.cabin_class,
        flight_count = excluded.flight_count,
        hotel_count = excluded.hotel_count,
        car_count = excluded.car_count,
        experience_count = excluded.experience_count,
        providers_queried = excluded.providers_queried,
        status = excluded.status,
        applied_filters = excluded.applied_filters,
        sort_by = excluded.sort_by,
        search_started = excluded.search_started,
        search_completed = excluded.search_completed,
        filters_applied = excluded.filters_applied,
        sorts_applied = excluded.sorts_applied,
        offers_clicked = excluded.offers_clicked,
        offers_saved = excluded.offers_saved,
        results_viewed = excluded.results_viewed,
        last_activity = excluded.last_activity,
        snapshot = excluded.snapshot
";

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE search_sessions (
        token TEXT PRIMARY KEY,
        user_id TEXT,
        anonymous_id TEXT,
        destination_code TEXT NOT NULL,
        origin_code TEXT,
        mode TEXT,
        start_date TEXT,
        end_date TEXT,
        adults INTEGER NOT NULL DEFAULT 1,
        children INTEGER NOT NULL DEFAULT 0,
        infants INTEGER NOT NULL DEFAULT 0,
        cabin_class TEXT,
        flight_count INTEGER NOT NULL DEFAULT 0,
        hotel_count INTEGER NOT NULL DEFAULT 0,
        car_count INTEGER NOT NULL DEFAULT 0,
        experience_count INTEGER NOT NULL DEFAULT 0,
        providers_queried TEXT NOT NULL DEFAULT '[]',  -- JSON array
        status TEXT NOT NULL,
        applied_filters TEXT NOT NULL DEFAULT '{}',    -- JSON object
        sort_by TEXT,
        search_started INTEGER NOT NULL,
        search_completed INTEGER,
        filters_applied INTEGER NOT NULL DEFAULT 0,
        sorts_applied INTEGER NOT NULL DEFAULT 0,
        offers_clicked INTEGER NOT NULL DEFAULT 0,
        offers_saved INTEGER NOT NULL DEFAULT 0,
        results_viewed INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        last_activity INTEGER NOT NULL,
        snapshot TEXT NOT NULL
    );

    CREATE INDEX idx_search_sessions_user ON search_sessions(user_id);
    CREATE INDEX idx_search_sessions_status ON search_sessions(status);
    CREATE INDEX idx_search_sessions_last_activity ON search_sessions(last_activity);
    "#,
];

/// [`SessionStore`] backed by the SQLite database
///
/// Queries run on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Database,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(db_path: &Path, pool_size: u32) -> Result<Self> {
        Ok(Self::new(Database::new(db_path, pool_size)?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, token: &str) -> Result<Option<SearchSession>> {
        let db = self.db.clone();
        let token = token.to_string();
        tokio::task::spawn_blocking(move || db.load_session(&token)).await?
    }

    async fn upsert(&self, session: &SearchSession) -> Result<()> {
        let db = self.db.clone();
        let session = session.clone();
        tokio::task::spawn_blocking(move || db.upsert_session(&session)).await?
    }
}
