//! Subscription API endpoints
//!
//! Handles HTTP requests for notification subscriptions:
//! - GET  /api/settings - Current per-guild notification settings
//! - POST /api/settings - Apply the seven category on/off states
//! - GET  /api/alerts - List tracked alerts for a guild
//! - POST /api/alerts/{kind}/new - Track a target (merges areas if it exists)
//! - POST /api/alerts/{kind}/edit - Update a tracked target (replaces areas)
//! - POST /api/alerts/{kind}/delete - Stop tracking a target
//! - GET  /api/status - Operator metrics (clients online)
//!
//! All routes sit behind the access gate; handlers read the caller's
//! identity from the request extension the gate attached.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{NotificationKind, Subscription, TrackedAlert};
use crate::services::{merge_areas, AreaSelection, RequestIdentity};

/// Build the subscription router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).post(update_settings))
        .route("/alerts", get(list_alerts))
        .route("/alerts/{kind}/new", post(new_alert))
        .route("/alerts/{kind}/edit", post(edit_alert))
        .route("/alerts/{kind}/delete", post(delete_alert))
        .route("/status", get(server_status))
}

// ============================================================================
// Settings
// ============================================================================

/// Query parameters scoping a request to one guild
#[derive(Debug, Deserialize)]
pub struct GuildQuery {
    pub guild_id: String,
}

/// Request body for updating settings
///
/// Each category carries its absolute desired state; the handler applies
/// all seven, so updates to distinct categories commute.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub guild_id: String,
    pub icon_style: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub enable_pokemon: bool,
    #[serde(default)]
    pub enable_pvp: bool,
    #[serde(default)]
    pub enable_raids: bool,
    #[serde(default)]
    pub enable_quests: bool,
    #[serde(default)]
    pub enable_invasions: bool,
    #[serde(default)]
    pub enable_lures: bool,
    #[serde(default)]
    pub enable_gyms: bool,
}

impl UpdateSettingsRequest {
    fn desired_states(&self) -> [(NotificationKind, bool); 7] {
        [
            (NotificationKind::Pokemon, self.enable_pokemon),
            (NotificationKind::Pvp, self.enable_pvp),
            (NotificationKind::Raids, self.enable_raids),
            (NotificationKind::Quests, self.enable_quests),
            (NotificationKind::Invasions, self.enable_invasions),
            (NotificationKind::Lures, self.enable_lures),
            (NotificationKind::Gyms, self.enable_gyms),
        ]
    }
}

/// Response for settings reads and writes
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub guild_id: String,
    pub enable_pokemon: bool,
    pub enable_pvp: bool,
    pub enable_raids: bool,
    pub enable_quests: bool,
    pub enable_invasions: bool,
    pub enable_lures: bool,
    pub enable_gyms: bool,
    pub icon_style: String,
    pub location: Option<String>,
    pub phone_number: Option<String>,
}

impl From<Subscription> for SettingsResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            guild_id: sub.guild_id,
            enable_pokemon: sub.status.is_enabled(NotificationKind::Pokemon),
            enable_pvp: sub.status.is_enabled(NotificationKind::Pvp),
            enable_raids: sub.status.is_enabled(NotificationKind::Raids),
            enable_quests: sub.status.is_enabled(NotificationKind::Quests),
            enable_invasions: sub.status.is_enabled(NotificationKind::Invasions),
            enable_lures: sub.status.is_enabled(NotificationKind::Lures),
            enable_gyms: sub.status.is_enabled(NotificationKind::Gyms),
            icon_style: sub.icon_style,
            location: sub.location,
            phone_number: sub.phone_number,
        }
    }
}

/// GET /api/settings - Current notification settings for one guild
async fn get_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Query(query): Query<GuildQuery>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let subscription = state
        .subscriptions
        .get_settings(&query.guild_id, &identity.user_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .unwrap_or_else(|| Subscription::new(&query.guild_id, &identity.user_id));

    Ok(Json(subscription.into()))
}

/// POST /api/settings - Apply category states and presentation fields
async fn update_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let mut subscription = state
        .subscriptions
        .get_settings(&body.guild_id, &identity.user_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .unwrap_or_else(|| Subscription::new(&body.guild_id, &identity.user_id));

    for (kind, enabled) in body.desired_states() {
        subscription.status.set_enabled(kind, enabled);
    }
    if let Some(icon_style) = body.icon_style {
        subscription.icon_style = icon_style;
    }
    subscription.location = body.location;
    subscription.phone_number = body.phone_number;

    state
        .subscriptions
        .save_settings(subscription.clone())
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    tracing::info!(
        user_id = %identity.user_id,
        guild_id = %subscription.guild_id,
        "updated subscription settings"
    );
    Ok(Json(subscription.into()))
}

// ============================================================================
// Tracked alerts
// ============================================================================

/// Request body for tracking or updating a target
#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub guild_id: String,
    /// Category-specific subject (Pokémon name, raid boss, quest reward, ...)
    pub target: String,
    /// Raw city/geofence selection; omitted or empty means "no change"
    pub city: Option<AreaSelection>,
    pub location: Option<String>,
}

/// Request body for deleting a tracked alert
#[derive(Debug, Deserialize)]
pub struct DeleteAlertRequest {
    pub guild_id: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub kind: NotificationKind,
    pub target: String,
    pub areas: Vec<String>,
    pub location: Option<String>,
}

impl From<TrackedAlert> for AlertResponse {
    fn from(alert: TrackedAlert) -> Self {
        Self {
            kind: alert.kind,
            target: alert.target,
            areas: alert.areas,
            location: alert.location,
        }
    }
}

/// Resolve the request's selection, or leave areas untouched when empty
fn resolve_selection(
    state: &AppState,
    guild_id: &str,
    city: &Option<AreaSelection>,
) -> Result<Option<Vec<String>>, ApiError> {
    match city {
        Some(selection) if !selection.is_empty() => state
            .areas
            .resolve(guild_id, selection)
            .map(Some)
            .map_err(|e| ApiError::validation_error(e.to_string())),
        _ => Ok(None),
    }
}

/// GET /api/alerts - List tracked alerts for a guild
async fn list_alerts(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Query(query): Query<GuildQuery>,
) -> Result<Json<Vec<AlertResponse>>, ApiError> {
    let alerts = state
        .subscriptions
        .list_alerts(&query.guild_id, &identity.user_id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(alerts.into_iter().map(Into::into).collect()))
}

/// POST /api/alerts/{kind}/new - Track a target
///
/// When the target is already tracked, the newly resolved areas are
/// unioned into the existing list; a brand-new record takes them as-is.
async fn new_alert(
    State(state): State<AppState>,
    Path(kind): Path<NotificationKind>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<AlertRequest>,
) -> Result<Json<AlertResponse>, ApiError> {
    let resolved = resolve_selection(&state, &body.guild_id, &body.city)?.unwrap_or_default();

    let existing = state
        .subscriptions
        .get_alert(&body.guild_id, &identity.user_id, kind, &body.target)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let alert = match existing {
        Some(mut alert) => {
            alert.areas = merge_areas(&alert.areas, &resolved);
            alert.location = body.location;
            alert
        }
        None => TrackedAlert {
            guild_id: body.guild_id,
            user_id: identity.user_id.clone(),
            kind,
            target: body.target,
            areas: resolved,
            location: body.location,
        },
    };

    state
        .subscriptions
        .save_alert(alert.clone())
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    tracing::info!(
        user_id = %identity.user_id,
        guild_id = %alert.guild_id,
        target = %alert.target,
        "tracked alert saved"
    );
    Ok(Json(alert.into()))
}

/// POST /api/alerts/{kind}/edit - Update a tracked target
///
/// Unlike `new`, an edit replaces the stored area list with the resolved
/// one; an empty selection leaves it untouched.
async fn edit_alert(
    State(state): State<AppState>,
    Path(kind): Path<NotificationKind>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<AlertRequest>,
) -> Result<Json<AlertResponse>, ApiError> {
    let resolved = resolve_selection(&state, &body.guild_id, &body.city)?;

    let mut alert = state
        .subscriptions
        .get_alert(&body.guild_id, &identity.user_id, kind, &body.target)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("No such tracked alert"))?;

    if let Some(areas) = resolved {
        alert.areas = areas;
    }
    alert.location = body.location;

    state
        .subscriptions
        .save_alert(alert.clone())
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(alert.into()))
}

/// POST /api/alerts/{kind}/delete - Stop tracking a target
async fn delete_alert(
    State(state): State<AppState>,
    Path(kind): Path<NotificationKind>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<DeleteAlertRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .subscriptions
        .delete_alert(&body.guild_id, &identity.user_id, kind, &body.target)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    if !deleted {
        return Err(ApiError::not_found("No such tracked alert"));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ============================================================================
// Operator status
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub clients_online: u64,
}

/// GET /api/status - Operator-facing metrics
async fn server_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let clients_online = state
        .sessions
        .len()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(StatusResponse { clients_online }))
}
