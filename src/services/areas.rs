//! Area resolution service
//!
//! Turns a user's raw city/geofence selection into the concrete area list
//! persisted on subscription records. Selections arrive either as a single
//! value or as a list, and may contain the sentinels `All` and `None`;
//! resolution applies a fixed precedence chain (`All` supersedes
//! everything, `None` alone clears, `None` mixed with real areas is
//! dropped as checkbox noise) against the guild's configured geofences.

use serde::Deserialize;
use std::sync::Arc;

use crate::config::GuildCatalog;

/// Sentinel selecting every geofence the guild has configured
pub const AREA_ALL: &str = "All";
/// Sentinel selecting no geofences
pub const AREA_NONE: &str = "None";

/// A raw, request-scoped area selection
///
/// Deserializes from either a bare string or a string array, matching the
/// two shapes clients submit. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AreaSelection {
    One(String),
    Many(Vec<String>),
}

impl AreaSelection {
    /// Parse the comma-joined form field the dashboard posts
    ///
    /// A value without commas is a scalar selection; with commas it is a
    /// list in submission order.
    pub fn from_form(raw: &str) -> Self {
        if raw.contains(',') {
            Self::Many(raw.split(',').map(str::to_string).collect())
        } else {
            Self::One(raw.to_string())
        }
    }

    /// Whether the selection carries no values at all
    ///
    /// Callers treat an empty selection as "no change to areas" and skip
    /// resolution entirely.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(name) => name.is_empty(),
            Self::Many(list) => list.is_empty(),
        }
    }
}

/// Error type for area resolution
#[derive(Debug, thiserror::Error)]
pub enum AreaError {
    /// The selection referenced a guild the dashboard is not configured
    /// for. A configuration or integration bug, not a user mistake.
    #[error("no guild registered with id '{0}'")]
    UnknownGuild(String),
}

/// Resolves raw area selections against the guild catalog
pub struct AreaService {
    guilds: Arc<GuildCatalog>,
}

impl AreaService {
    /// Create a new area service over the configured guilds
    pub fn new(guilds: Arc<GuildCatalog>) -> Self {
        Self { guilds }
    }

    /// Resolve a selection into a concrete area list
    ///
    /// Precedence, evaluated in this exact order:
    /// 1. `All` (scalar, or anywhere in a list) wins outright and yields
    ///    the guild's full geofence list, even when `None` or specific
    ///    areas are also present. This is the only path that consults the
    ///    catalog, so it is the only path that can fail with
    ///    [`AreaError::UnknownGuild`].
    /// 2. A scalar `None` yields no areas.
    /// 3. Any other scalar yields exactly that one area.
    /// 4. A list without `All` keeps its order; when it mixes `None` with
    ///    real selections, exactly the first `None` is dropped and the
    ///    remainder kept.
    pub fn resolve(
        &self,
        guild_id: &str,
        selection: &AreaSelection,
    ) -> Result<Vec<String>, AreaError> {
        match selection {
            AreaSelection::One(name) if name == AREA_ALL => self.all_areas(guild_id),
            AreaSelection::Many(list) if list.iter().any(|a| a == AREA_ALL) => {
                self.all_areas(guild_id)
            }
            AreaSelection::One(name) if name == AREA_NONE || name.is_empty() => Ok(Vec::new()),
            AreaSelection::One(name) => Ok(vec![name.clone()]),
            AreaSelection::Many(list) => {
                let mut areas = list.clone();
                if areas.len() > 1 {
                    if let Some(pos) = areas.iter().position(|a| a == AREA_NONE) {
                        areas.remove(pos);
                    }
                }
                Ok(areas)
            }
        }
    }

    fn all_areas(&self, guild_id: &str) -> Result<Vec<String>, AreaError> {
        self.guilds
            .lookup(guild_id)
            .map(|guild| guild.geofences.clone())
            .ok_or_else(|| AreaError::UnknownGuild(guild_id.to_string()))
    }
}

/// Union an existing area list with newly resolved areas
///
/// Keeps `existing` in its original order, then appends any element of
/// `resolved` not already present, in resolved order. Used on the
/// update-if-exists path of alert upsert; new records take the resolved
/// list directly.
pub fn merge_areas(existing: &[String], resolved: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + resolved.len());
    for area in existing.iter().chain(resolved.iter()) {
        if !merged.iter().any(|a| a == area) {
            merged.push(area.clone());
        }
    }
    merged
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::config::GuildConfig;
    use proptest::prelude::*;

    fn area_name() -> impl Strategy<Value = String> {
        "[A-Za-z]{1,8}"
    }

    fn service_with(geofences: Vec<String>) -> AreaService {
        AreaService::new(Arc::new(GuildCatalog::new(vec![GuildConfig {
            id: "g1".to_string(),
            required_roles: vec![],
            geofences,
        }])))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn property_all_anywhere_yields_full_list(
            geofences in prop::collection::vec(area_name(), 1..6),
            mut list in prop::collection::vec(area_name(), 0..5),
            at in 0usize..5,
        ) {
            let svc = service_with(geofences.clone());
            list.insert(at.min(list.len()), AREA_ALL.to_string());
            let resolved = svc.resolve("g1", &AreaSelection::Many(list)).unwrap();
            prop_assert_eq!(resolved, geofences);
        }

        #[test]
        fn property_plain_lists_resolve_unchanged(
            list in prop::collection::vec(area_name(), 0..6),
        ) {
            prop_assume!(list.iter().all(|a| a != AREA_ALL && a != AREA_NONE));
            let svc = service_with(vec!["North".to_string()]);
            let resolved = svc.resolve("g1", &AreaSelection::Many(list.clone())).unwrap();
            prop_assert_eq!(resolved, list);
        }

        #[test]
        fn property_merge_has_no_duplicates(
            existing in prop::collection::vec(area_name(), 0..6),
            resolved in prop::collection::vec(area_name(), 0..6),
        ) {
            let merged = merge_areas(&existing, &resolved);
            for (i, area) in merged.iter().enumerate() {
                prop_assert!(!merged[i + 1..].contains(area));
            }
        }

        #[test]
        fn property_merge_keeps_every_input(
            existing in prop::collection::vec(area_name(), 0..6),
            resolved in prop::collection::vec(area_name(), 0..6),
        ) {
            let merged = merge_areas(&existing, &resolved);
            for area in existing.iter().chain(resolved.iter()) {
                prop_assert!(merged.contains(area));
            }
        }

        #[test]
        fn property_merge_is_idempotent_on_self(
            areas in prop::collection::vec(area_name(), 0..6),
        ) {
            let once = merge_areas(&areas, &[]);
            let twice = merge_areas(&once, &areas);
            prop_assert_eq!(once, twice);
        }
    }
}
