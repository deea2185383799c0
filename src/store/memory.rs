//! In-memory subscription store
//!
//! HashMap-backed implementation of [`SubscriptionStore`] for
//! single-instance deployments and tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::SubscriptionStore;
use crate::models::{NotificationKind, Subscription, TrackedAlert};

type SettingsKey = (String, String);
type AlertKey = (String, String, NotificationKind, String);

/// In-memory subscription store
#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    settings: RwLock<HashMap<SettingsKey, Subscription>>,
    alerts: RwLock<HashMap<AlertKey, TrackedAlert>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn get_settings(&self, guild_id: &str, user_id: &str) -> Result<Option<Subscription>> {
        let settings = self.settings.read().await;
        Ok(settings
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn save_settings(&self, subscription: Subscription) -> Result<()> {
        let key = (subscription.guild_id.clone(), subscription.user_id.clone());
        self.settings.write().await.insert(key, subscription);
        Ok(())
    }

    async fn get_alert(
        &self,
        guild_id: &str,
        user_id: &str,
        kind: NotificationKind,
        target: &str,
    ) -> Result<Option<TrackedAlert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .get(&(
                guild_id.to_string(),
                user_id.to_string(),
                kind,
                target.to_string(),
            ))
            .cloned())
    }

    async fn save_alert(&self, alert: TrackedAlert) -> Result<()> {
        let key = (
            alert.guild_id.clone(),
            alert.user_id.clone(),
            alert.kind,
            alert.target.clone(),
        );
        self.alerts.write().await.insert(key, alert);
        Ok(())
    }

    async fn delete_alert(
        &self,
        guild_id: &str,
        user_id: &str,
        kind: NotificationKind,
        target: &str,
    ) -> Result<bool> {
        let key = (
            guild_id.to_string(),
            user_id.to_string(),
            kind,
            target.to_string(),
        );
        Ok(self.alerts.write().await.remove(&key).is_some())
    }

    async fn list_alerts(&self, guild_id: &str, user_id: &str) -> Result<Vec<TrackedAlert>> {
        let alerts = self.alerts.read().await;
        let mut found: Vec<TrackedAlert> = alerts
            .values()
            .filter(|a| a.guild_id == guild_id && a.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.target.cmp(&b.target));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationStatus;

    fn alert(target: &str, areas: &[&str]) -> TrackedAlert {
        TrackedAlert {
            guild_id: "g1".to_string(),
            user_id: "u1".to_string(),
            kind: NotificationKind::Pokemon,
            target: target.to_string(),
            areas: areas.iter().map(|a| a.to_string()).collect(),
            location: None,
        }
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = MemorySubscriptionStore::new();
        assert!(store.get_settings("g1", "u1").await.unwrap().is_none());

        let mut sub = Subscription::new("g1", "u1");
        sub.status.enable(NotificationKind::Raids);
        store.save_settings(sub).await.unwrap();

        let found = store.get_settings("g1", "u1").await.unwrap().unwrap();
        assert!(found.status.is_enabled(NotificationKind::Raids));
        assert_eq!(found.status, NotificationStatus::RAIDS);
    }

    #[tokio::test]
    async fn test_save_settings_replaces_existing() {
        let store = MemorySubscriptionStore::new();
        store.save_settings(Subscription::new("g1", "u1")).await.unwrap();

        let mut updated = Subscription::new("g1", "u1");
        updated.location = Some("Downtown".to_string());
        store.save_settings(updated).await.unwrap();

        let found = store.get_settings("g1", "u1").await.unwrap().unwrap();
        assert_eq!(found.location.as_deref(), Some("Downtown"));
    }

    #[tokio::test]
    async fn test_alert_round_trip_and_delete() {
        let store = MemorySubscriptionStore::new();
        store.save_alert(alert("pikachu", &["North"])).await.unwrap();

        let found = store
            .get_alert("g1", "u1", NotificationKind::Pokemon, "pikachu")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.areas, vec!["North"]);

        assert!(store
            .delete_alert("g1", "u1", NotificationKind::Pokemon, "pikachu")
            .await
            .unwrap());
        assert!(!store
            .delete_alert("g1", "u1", NotificationKind::Pokemon, "pikachu")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_alerts_keyed_by_kind_and_target() {
        let store = MemorySubscriptionStore::new();
        store.save_alert(alert("pikachu", &["North"])).await.unwrap();

        let mut raid = alert("pikachu", &["South"]);
        raid.kind = NotificationKind::Raids;
        store.save_alert(raid).await.unwrap();

        let pokemon = store
            .get_alert("g1", "u1", NotificationKind::Pokemon, "pikachu")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pokemon.areas, vec!["North"]);

        let raids = store
            .get_alert("g1", "u1", NotificationKind::Raids, "pikachu")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raids.areas, vec!["South"]);
    }

    #[tokio::test]
    async fn test_list_alerts_scoped_to_guild_and_user() {
        let store = MemorySubscriptionStore::new();
        store.save_alert(alert("pikachu", &[])).await.unwrap();
        store.save_alert(alert("eevee", &[])).await.unwrap();

        let mut other = alert("snorlax", &[]);
        other.user_id = "u2".to_string();
        store.save_alert(other).await.unwrap();

        let listed = store.list_alerts("g1", "u1").await.unwrap();
        let targets: Vec<&str> = listed.iter().map(|a| a.target.as_str()).collect();
        assert_eq!(targets, vec!["eevee", "pikachu"]);
    }
}
