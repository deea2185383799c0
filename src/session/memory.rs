//! In-memory session store implementation using moka
//!
//! Provides a fast, thread-safe session store with TTL-based eviction,
//! standing in for an external key-value store in single-instance
//! deployments. Sessions live until their TTL elapses; eviction is the
//! only way a session is destroyed.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::{SessionStore, SessionStoreError};
use crate::config::SessionConfig;
use crate::models::Session;

/// Default session TTL (1 day)
const DEFAULT_TTL: Duration = Duration::from_secs(86400);

/// Default maximum number of cached sessions
const DEFAULT_MAX_SESSIONS: u64 = 10_000;

/// In-memory session store backed by moka
pub struct MemorySessionStore {
    sessions: Cache<String, Session>,
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("entry_count", &self.sessions.entry_count())
            .finish()
    }
}

impl MemorySessionStore {
    /// Create a store with default TTL and capacity
    pub fn new() -> Self {
        Self::with_ttl_and_capacity(DEFAULT_TTL, DEFAULT_MAX_SESSIONS)
    }

    /// Create a store from the session config section
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_ttl_and_capacity(
            Duration::from_secs(config.ttl_seconds),
            config.max_sessions,
        )
    }

    /// Create a store with a custom TTL and capacity
    pub fn with_ttl_and_capacity(ttl: Duration, max_sessions: u64) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_live(ttl)
            .build();
        Self { sessions }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.get(id).await)
    }

    async fn put(&self, id: &str, session: Session) -> Result<(), SessionStoreError> {
        self.sessions.insert(id.to_string(), session).await;
        Ok(())
    }

    async fn len(&self) -> Result<u64, SessionStoreError> {
        // entry_count is eventually consistent; flush pending maintenance
        // first so the operator metric tracks reality closely.
        self.sessions.run_pending_tasks().await;
        Ok(self.sessions.entry_count())
    }
}
