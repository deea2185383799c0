//! Subscription models
//!
//! A `Subscription` is the per-guild, per-user settings record the
//! companion bot reads: which notification categories are enabled (one
//! bitmask integer) plus a few presentation fields. `TrackedAlert` is one
//! tracked target within a category, carrying the resolved area list.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The notification categories a subscription can enable
///
/// Closed enumeration: each category maps to a fixed bit position in
/// `NotificationStatus` (declaration order), so an out-of-range category
/// cannot be represented at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Pokemon,
    Pvp,
    Raids,
    Quests,
    Invasions,
    Lures,
    Gyms,
}

impl NotificationKind {
    /// All categories, in bit-position order
    pub const ALL: [NotificationKind; 7] = [
        NotificationKind::Pokemon,
        NotificationKind::Pvp,
        NotificationKind::Raids,
        NotificationKind::Quests,
        NotificationKind::Invasions,
        NotificationKind::Lures,
        NotificationKind::Gyms,
    ];

    /// The status bit for this category
    pub fn flag(self) -> NotificationStatus {
        match self {
            NotificationKind::Pokemon => NotificationStatus::POKEMON,
            NotificationKind::Pvp => NotificationStatus::PVP,
            NotificationKind::Raids => NotificationStatus::RAIDS,
            NotificationKind::Quests => NotificationStatus::QUESTS,
            NotificationKind::Invasions => NotificationStatus::INVASIONS,
            NotificationKind::Lures => NotificationStatus::LURES,
            NotificationKind::Gyms => NotificationStatus::GYMS,
        }
    }
}

bitflags! {
    /// Enabled notification categories packed into one integer
    ///
    /// Bit k is category k in `NotificationKind` declaration order. The
    /// integer round-trips through serde so the value can be persisted
    /// and handed to the companion bot as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NotificationStatus: i64 {
        const POKEMON   = 1 << 0;
        const PVP       = 1 << 1;
        const RAIDS     = 1 << 2;
        const QUESTS    = 1 << 3;
        const INVASIONS = 1 << 4;
        const LURES     = 1 << 5;
        const GYMS      = 1 << 6;
    }
}

impl NotificationStatus {
    /// Set the bit for `kind`; idempotent if already set
    pub fn enable(&mut self, kind: NotificationKind) {
        self.insert(kind.flag());
    }

    /// Clear the bit for `kind`; idempotent if already clear
    pub fn disable(&mut self, kind: NotificationKind) {
        self.remove(kind.flag());
    }

    /// Whether the bit for `kind` is set
    pub fn is_enabled(self, kind: NotificationKind) -> bool {
        self.contains(kind.flag())
    }

    /// Set or clear the bit for `kind` from a desired on/off state
    ///
    /// The settings form submits each category's absolute state, not a
    /// diff, so distinct-category updates commute.
    pub fn set_enabled(&mut self, kind: NotificationKind, enabled: bool) {
        if enabled {
            self.enable(kind);
        } else {
            self.disable(kind);
        }
    }
}

impl Serialize for NotificationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.bits())
    }
}

impl<'de> Deserialize<'de> for NotificationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = i64::deserialize(deserializer)?;
        Ok(NotificationStatus::from_bits_truncate(bits))
    }
}

/// Per-guild, per-user subscription settings record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub guild_id: String,
    pub user_id: String,
    /// Enabled notification categories
    pub status: NotificationStatus,
    /// Default notification location name
    pub location: Option<String>,
    /// Icon style the bot uses in notification embeds
    pub icon_style: String,
    /// Phone number for SMS alerts
    pub phone_number: Option<String>,
}

impl Subscription {
    /// A fresh settings record with every category disabled
    pub fn new(guild_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            user_id: user_id.into(),
            status: NotificationStatus::empty(),
            location: None,
            icon_style: "Default".to_string(),
            phone_number: None,
        }
    }
}

/// One tracked target within a notification category
///
/// `target` is the category-specific subject (a Pokémon name, raid boss,
/// quest reward and so on); `areas` is the resolved geofence list the
/// alert is restricted to. An empty list means no geofence restriction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedAlert {
    pub guild_id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub target: String,
    pub areas: Vec<String>,
    pub location: Option<String>,
}
