use super::SessionStore;
use crate::error::Result;
use crate::session::SearchSession;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session store kept in process memory
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SearchSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> Result<Option<SearchSession>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn upsert(&self, session: &SearchSession) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }
}
