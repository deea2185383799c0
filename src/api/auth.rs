//! Authentication API endpoints
//!
//! Handles HTTP requests for Discord OAuth login:
//! - GET /api/discord/login - Redirect to the Discord authorization page
//! - GET /api/discord/callback - Complete the code exchange and build the session
//!
//! Both routes are mounted outside the access-gate layer. The callback
//! populates the session with everything the gate later checks: identity,
//! guild memberships, per-guild role names, and the `valid` verdict cached
//! at login time.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::{extract_session_id, session_cookie, ApiError, AppState, LOGIN_PATH};
use crate::models::Session;

/// Build the Discord OAuth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
}

/// GET /api/discord/login - Redirect to the Discord authorization page
async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.discord.authorize_url())
}

/// Query parameters for the OAuth callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// GET /api/discord/callback - Complete the OAuth login
async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let Some(code) = query.code else {
        return Err(ApiError::validation_error("NoCodeProvided"));
    };

    let token = state.discord.exchange_code(&code).await.map_err(|e| {
        tracing::error!("token exchange failed: {e:#}");
        ApiError::internal_error("UnableToFetchToken")
    })?;

    let user = state
        .discord
        .fetch_user(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to fetch user: {e}")))?;
    let guilds = state
        .discord
        .fetch_guilds(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to fetch guilds: {e}")))?;
    let roles = state
        .discord
        .build_guild_roles(&user.id, &guilds)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to fetch roles: {e}")))?;

    let whitelist = &state.discord_config.user_id_whitelist;
    let whitelisted = !whitelist.is_empty() && whitelist.contains(&user.id);
    if whitelisted {
        tracing::info!(user_id = %user.id, "user in whitelist, skipping role and guild check");
    }
    let valid = whitelisted || state.guilds.serves_any(&guilds);

    // Reuse the anonymous session when one exists so the path recorded at
    // denial time survives the login round-trip.
    let (session_id, previous_path) = match extract_session_id(&headers) {
        Some(id) => {
            let previous = state
                .sessions
                .get(&id)
                .await
                .map_err(|e| ApiError::internal_error(e.to_string()))?
                .and_then(|s| s.current_path);
            (id, previous)
        }
        None => (Uuid::new_v4().to_string(), None),
    };

    let session = Session {
        logged_in: true,
        user_id: user.id.clone(),
        username: user.tag(),
        guilds,
        roles,
        valid,
        current_path: None,
        created_at: Utc::now(),
    };
    state
        .sessions
        .put(&session_id, session)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let target = if valid {
        tracing::info!(user_id = %user.id, "authenticated successfully");
        match previous_path {
            Some(path) => {
                tracing::info!(user_id = %user.id, path = %path, "redirecting to previous page");
                path
            }
            None => "/".to_string(),
        }
    } else {
        // Not in the configured Discord server(s)
        tracing::warn!(user_id = %user.id, "not authorized to access dashboard");
        LOGIN_PATH.to_string()
    };

    let mut response = Redirect::to(&target).into_response();
    if let Ok(value) = session_cookie(&session_id).parse() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}
