//! Services layer - Business logic
//!
//! This module contains the business logic of the dashboard. Services are
//! responsible for:
//! - Deciding per-request access (session + role/guild verdict)
//! - Resolving raw area selections against the guild catalog
//! - Talking to the Discord OAuth and REST endpoints

pub mod areas;
pub mod auth;
pub mod discord;

pub use areas::{merge_areas, AreaError, AreaSelection, AreaService, AREA_ALL, AREA_NONE};
pub use auth::{AccessDecision, AccessGate, RequestIdentity};
pub use discord::{DiscordClient, DiscordUser};
