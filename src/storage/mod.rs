//! Durable session storage
//!
//! The session manager keeps hot sessions in memory and writes every change
//! through to a [`SessionStore`]. SQLite is the default backend.

mod database;
mod memory;

pub use database::{Database, DbPool, DbStats, SqliteSessionStore};
pub use memory::InMemorySessionStore;

use crate::error::Result;
use crate::session::SearchSession;
use async_trait::async_trait;

/// Keyed get/upsert of session snapshots
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by token
    async fn get(&self, token: &str) -> Result<Option<SearchSession>>;

    /// Insert or replace the session stored under its token
    async fn upsert(&self, session: &SearchSession) -> Result<()>;
}
