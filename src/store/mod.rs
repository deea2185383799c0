//! Subscription storage
//!
//! Collaborator contract for persisting subscription records. Route
//! handlers hand plain area lists and bitmask integers across this
//! boundary after invoking the core services; what backs it (here an
//! in-memory map, in larger deployments a database owned by the
//! companion bot) is not this dashboard's concern.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NotificationKind, Subscription, TrackedAlert};

pub use memory::MemorySubscriptionStore;

/// Subscription store trait
///
/// Settings records are keyed by guild + user; tracked alerts by
/// guild + user + category + target. Saves are whole-record upserts;
/// concurrent saves to the same key are last-write-wins.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch a user's settings record for one guild
    async fn get_settings(&self, guild_id: &str, user_id: &str) -> Result<Option<Subscription>>;

    /// Create or replace a settings record
    async fn save_settings(&self, subscription: Subscription) -> Result<()>;

    /// Fetch one tracked alert
    async fn get_alert(
        &self,
        guild_id: &str,
        user_id: &str,
        kind: NotificationKind,
        target: &str,
    ) -> Result<Option<TrackedAlert>>;

    /// Create or replace a tracked alert
    async fn save_alert(&self, alert: TrackedAlert) -> Result<()>;

    /// Delete one tracked alert; returns whether it existed
    async fn delete_alert(
        &self,
        guild_id: &str,
        user_id: &str,
        kind: NotificationKind,
        target: &str,
    ) -> Result<bool>;

    /// List a user's tracked alerts for one guild
    async fn list_alerts(&self, guild_id: &str, user_id: &str) -> Result<Vec<TrackedAlert>>;
}
