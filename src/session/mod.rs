//! Session store
//!
//! This module provides the session storage abstraction for the dashboard.
//! It supports:
//! - In-memory store (moka) - default, for single-instance deployment
//!
//! Sessions are keyed by an opaque id carried in a cookie and evicted by
//! TTL; there is no explicit logout. A store failure is an infrastructure
//! fault and surfaces as [`SessionStoreError`], never as "not authorized",
//! so operators can tell outages from access denials.

pub mod memory;

use async_trait::async_trait;

use crate::models::Session;

pub use memory::MemorySessionStore;

/// Error type for session store failures
#[derive(Debug, thiserror::Error)]
#[error("session store unavailable: {0}")]
pub struct SessionStoreError(#[from] pub anyhow::Error);

/// Session store trait
///
/// The store is keyed per session, so concurrent requests from different
/// users never contend. `len` exists only for the operator-facing
/// "clients online" metric and is not security-relevant.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id
    async fn get(&self, id: &str) -> Result<Option<Session>, SessionStoreError>;

    /// Store a session under the given id
    async fn put(&self, id: &str, session: Session) -> Result<(), SessionStoreError>;

    /// Number of live sessions
    async fn len(&self) -> Result<u64, SessionStoreError>;
}
