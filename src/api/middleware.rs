//! API middleware
//!
//! Contains middleware for:
//! - Authentication/authorization (session-backed access gate)
//!
//! The middleware only translates: it pulls the session id out of the
//! cookie, asks the access gate for a decision, and turns that decision
//! into a pass-through, a login redirect, or a server error. Policy lives
//! in [`crate::services::auth`].

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{DiscordConfig, GuildCatalog};
use crate::services::{AccessDecision, AccessGate, AreaService, DiscordClient};
use crate::session::SessionStore;
use crate::store::SubscriptionStore;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Path unauthenticated requests are redirected to
pub const LOGIN_PATH: &str = "/login";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub sessions: Arc<dyn SessionStore>,
    pub areas: Arc<AreaService>,
    pub discord: Arc<DiscordClient>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub guilds: Arc<GuildCatalog>,
    pub discord_config: Arc<DiscordConfig>,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the session id from the request's cookie header
pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(id) = cookie.strip_prefix("session=") {
            return Some(id.to_string());
        }
    }
    None
}

/// Build the Set-Cookie value for a session id
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// Authentication middleware
///
/// Every route behind the login wall passes through here. The login and
/// OAuth-callback routes are mounted outside this layer, so they are never
/// gated.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = extract_session_id(request.headers());
    let path = request.uri().path().to_string();

    match state.gate.authorize(session_id.as_deref(), &path).await {
        Ok(AccessDecision::Granted(identity)) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Ok(AccessDecision::LoginRequired { new_session_id }) => {
            let mut response = Redirect::to(LOGIN_PATH).into_response();
            if let Some(id) = new_session_id {
                if let Ok(value) = session_cookie(&id).parse() {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
            response
        }
        Err(err) => {
            tracing::error!("session lookup failed: {err}");
            ApiError::internal_error("Session store unavailable").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_id_from_cookie() {
        let headers = headers_with_cookie("session=abc-123");
        assert_eq!(extract_session_id(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_extract_session_id_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; session=abc-123; lang=en");
        assert_eq!(extract_session_id(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_extract_session_id_missing() {
        assert!(extract_session_id(&HeaderMap::new()).is_none());
        let headers = headers_with_cookie("theme=dark");
        assert!(extract_session_id(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc-123");
        assert!(cookie.starts_with("session=abc-123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_api_error_status_mapping() {
        let response = ApiError::validation_error("bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ApiError::not_found("gone").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = ApiError::internal_error("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
