//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the dashboard.
//! It includes:
//! - Discord OAuth endpoints (login, callback)
//! - Subscription settings and tracked-alert endpoints
//! - Operator status endpoint
//!
//! The OAuth endpoints are public; everything else is layered behind the
//! access-gate middleware, so a request reaches a handler only with a
//! resolved identity attached.

pub mod auth;
pub mod middleware;
pub mod subscriptions;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, LOGIN_PATH, SESSION_COOKIE};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a session that passes the gate)
    let protected = subscriptions::router().route_layer(axum_middleware::from_fn_with_state(
        state,
        middleware::require_auth,
    ));

    // The OAuth routes stay outside the gate layer
    Router::new()
        .nest("/discord", auth::router())
        .merge(protected)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS configuration for cookie-based auth
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .route("/login", get(login_redirect))
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /login - Hand the browser over to the OAuth flow
///
/// The dashboard frontend serves its own login page in production; the
/// fallback here keeps the redirect chain working without one.
async fn login_redirect() -> Redirect {
    Redirect::to("/api/discord/login")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscordConfig, GuildCatalog, GuildConfig};
    use crate::models::Session;
    use crate::services::{AccessGate, AreaService, DiscordClient};
    use crate::session::{MemorySessionStore, SessionStore, SessionStoreError};
    use crate::store::MemorySubscriptionStore;
    use async_trait::async_trait;
    use axum::http::{HeaderValue, StatusCode};
    use axum_test::TestServer;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _id: &str) -> Result<Option<Session>, SessionStoreError> {
            Err(SessionStoreError(anyhow::anyhow!("connection refused")))
        }

        async fn put(&self, _id: &str, _session: Session) -> Result<(), SessionStoreError> {
            Err(SessionStoreError(anyhow::anyhow!("connection refused")))
        }

        async fn len(&self) -> Result<u64, SessionStoreError> {
            Err(SessionStoreError(anyhow::anyhow!("connection refused")))
        }
    }

    fn test_state(sessions: Arc<dyn SessionStore>) -> AppState {
        let discord_config = Arc::new(DiscordConfig {
            guilds: vec![GuildConfig {
                id: "g1".to_string(),
                required_roles: vec!["Member".to_string()],
                geofences: vec![
                    "North".to_string(),
                    "South".to_string(),
                    "East".to_string(),
                ],
            }],
            ..Default::default()
        });
        let guilds = GuildCatalog::from_config(&discord_config);

        AppState {
            gate: Arc::new(AccessGate::new(sessions.clone(), guilds.clone())),
            sessions,
            areas: Arc::new(AreaService::new(guilds.clone())),
            discord: Arc::new(DiscordClient::new((*discord_config).clone())),
            subscriptions: Arc::new(MemorySubscriptionStore::new()),
            guilds,
            discord_config,
        }
    }

    async fn server_with_valid_session() -> (TestServer, AppState) {
        let sessions = Arc::new(MemorySessionStore::new());
        let mut session = Session::anonymous("/");
        session.logged_in = true;
        session.valid = true;
        session.user_id = "u1".to_string();
        session.username = "trainer#0001".to_string();
        session.guilds = vec!["g1".to_string()];
        session.roles = HashMap::from([("g1".to_string(), vec!["Member".to_string()])]);
        session.current_path = None;
        sessions.put("sid", session).await.unwrap();

        let state = test_state(sessions);
        let server = TestServer::new(build_router(state.clone(), "http://localhost:3000")).unwrap();
        (server, state)
    }

    fn cookie() -> HeaderValue {
        HeaderValue::from_static("session=sid")
    }

    #[tokio::test]
    async fn test_unauthenticated_request_redirects_to_login() {
        let sessions = Arc::new(MemorySessionStore::new());
        let state = test_state(sessions.clone());
        let server = TestServer::new(build_router(state, "http://localhost:3000")).unwrap();

        let response = server.get("/api/settings").await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/login");

        // The denied path is remembered on a fresh session for the
        // post-login redirect.
        let set_cookie = response.header(header::SET_COOKIE);
        let set_cookie = set_cookie.to_str().unwrap();
        let id = set_cookie
            .strip_prefix("session=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let stored = sessions.get(id).await.unwrap().expect("session recorded");
        assert_eq!(stored.current_path.as_deref(), Some("/api/settings"));
    }

    #[tokio::test]
    async fn test_login_page_hands_over_to_oauth() {
        let state = test_state(Arc::new(MemorySessionStore::new()));
        let server = TestServer::new(build_router(state, "http://localhost:3000")).unwrap();

        let response = server.get("/login").await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/api/discord/login");
    }

    #[tokio::test]
    async fn test_session_store_fault_is_a_server_error() {
        let state = test_state(Arc::new(BrokenStore));
        let server = TestServer::new(build_router(state, "http://localhost:3000")).unwrap();

        let response = server
            .get("/api/settings")
            .add_header(header::COOKIE, cookie())
            .await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_settings_round_trip_through_the_gate() {
        let (server, _state) = server_with_valid_session().await;

        let response = server
            .get("/api/settings")
            .add_query_param("guild_id", "g1")
            .add_header(header::COOKIE, cookie())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let settings: serde_json::Value = response.json();
        assert_eq!(settings["enable_raids"], false);

        let response = server
            .post("/api/settings")
            .add_header(header::COOKIE, cookie())
            .json(&serde_json::json!({
                "guild_id": "g1",
                "enable_raids": true,
                "enable_gyms": true,
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let response = server
            .get("/api/settings")
            .add_query_param("guild_id", "g1")
            .add_header(header::COOKIE, cookie())
            .await;
        let settings: serde_json::Value = response.json();
        assert_eq!(settings["enable_raids"], true);
        assert_eq!(settings["enable_gyms"], true);
        assert_eq!(settings["enable_pokemon"], false);
    }

    #[tokio::test]
    async fn test_alert_with_all_in_selection_gets_every_geofence() {
        let (server, _state) = server_with_valid_session().await;

        let response = server
            .post("/api/alerts/pokemon/new")
            .add_header(header::COOKIE, cookie())
            .json(&serde_json::json!({
                "guild_id": "g1",
                "target": "pikachu",
                "city": ["North", "All"],
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let alert: serde_json::Value = response.json();
        assert_eq!(
            alert["areas"],
            serde_json::json!(["North", "South", "East"])
        );
    }

    #[tokio::test]
    async fn test_new_alert_merges_into_existing_areas() {
        let (server, _state) = server_with_valid_session().await;

        for city in [
            serde_json::json!("North"),
            serde_json::json!(["South", "North"]),
        ] {
            let response = server
                .post("/api/alerts/raids/new")
                .add_header(header::COOKIE, cookie())
                .json(&serde_json::json!({
                    "guild_id": "g1",
                    "target": "tyranitar",
                    "city": city,
                }))
                .await;
            assert_eq!(response.status_code(), StatusCode::OK);
        }

        let response = server
            .get("/api/alerts")
            .add_query_param("guild_id", "g1")
            .add_header(header::COOKIE, cookie())
            .await;
        let alerts: serde_json::Value = response.json();
        assert_eq!(alerts[0]["areas"], serde_json::json!(["North", "South"]));
    }

    #[tokio::test]
    async fn test_edit_alert_replaces_areas() {
        let (server, _state) = server_with_valid_session().await;

        server
            .post("/api/alerts/quests/new")
            .add_header(header::COOKIE, cookie())
            .json(&serde_json::json!({
                "guild_id": "g1",
                "target": "stardust",
                "city": ["North", "South"],
            }))
            .await;

        let response = server
            .post("/api/alerts/quests/edit")
            .add_header(header::COOKIE, cookie())
            .json(&serde_json::json!({
                "guild_id": "g1",
                "target": "stardust",
                "city": "East",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let alert: serde_json::Value = response.json();
        assert_eq!(alert["areas"], serde_json::json!(["East"]));
    }

    #[tokio::test]
    async fn test_all_selection_for_unknown_guild_is_rejected() {
        let (server, _state) = server_with_valid_session().await;

        let response = server
            .post("/api/alerts/pokemon/new")
            .add_header(header::COOKIE, cookie())
            .json(&serde_json::json!({
                "guild_id": "unknown",
                "target": "pikachu",
                "city": "All",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_reports_clients_online() {
        let (server, _state) = server_with_valid_session().await;

        let response = server
            .get("/api/status")
            .add_header(header::COOKIE, cookie())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let status: serde_json::Value = response.json();
        assert_eq!(status["clients_online"], 1);
    }
}
