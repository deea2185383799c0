//! Access gate
//!
//! Per-request authorization decision for everything behind the login
//! wall. The gate combines three inputs: the session fetched from the
//! store (the single async point per request), the verdict cached on the
//! session at login time, and a live recomputation of the role/guild
//! requirements against the static guild catalog. It returns a structured
//! decision; translating that into redirects or error responses is the
//! transport layer's job.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::GuildCatalog;
use crate::models::Session;
use crate::session::{SessionStore, SessionStoreError};

/// Identity attached to a request once access is granted
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub user_id: String,
    pub username: String,
}

/// Terminal decision for one request
#[derive(Debug)]
pub enum AccessDecision {
    /// Let the request through with the resolved identity
    Granted(RequestIdentity),
    /// Send the client to the login flow
    ///
    /// When the request carried no usable session, a fresh anonymous one
    /// was stored to remember the denied path; `new_session_id` is its id
    /// so the transport can set the cookie.
    LoginRequired { new_session_id: Option<String> },
}

/// Authorization gate with injected session-store and guild-catalog
/// dependencies
pub struct AccessGate {
    sessions: Arc<dyn SessionStore>,
    guilds: Arc<GuildCatalog>,
}

impl AccessGate {
    pub fn new(sessions: Arc<dyn SessionStore>, guilds: Arc<GuildCatalog>) -> Self {
        Self { sessions, guilds }
    }

    /// Decide whether the request may proceed
    ///
    /// `path` is the request path, recorded for the post-login redirect
    /// when the session is missing. A store failure propagates as
    /// [`SessionStoreError`] (a server fault), never as a denial.
    pub async fn authorize(
        &self,
        session_id: Option<&str>,
        path: &str,
    ) -> Result<AccessDecision, SessionStoreError> {
        let session = match session_id {
            Some(id) => self.sessions.get(id).await?,
            None => None,
        };

        let Some(session) = session else {
            let new_id = Uuid::new_v4().to_string();
            self.sessions.put(&new_id, Session::anonymous(path)).await?;
            return Ok(AccessDecision::LoginRequired {
                new_session_id: Some(new_id),
            });
        };

        if !session.logged_in {
            return Ok(AccessDecision::LoginRequired {
                new_session_id: None,
            });
        }

        // Both the verdict cached at login and the live role check must
        // hold; a role revoked since login locks the user out on their
        // next request.
        if !session.valid || !self.roles_grant_access(&session) {
            tracing::warn!(
                user_id = %session.user_id,
                "invalid user authentication, no valid roles for user"
            );
            return Ok(AccessDecision::LoginRequired {
                new_session_id: None,
            });
        }

        Ok(AccessDecision::Granted(RequestIdentity {
            user_id: session.user_id,
            username: session.username,
        }))
    }

    /// Live role/guild recomputation
    ///
    /// True when, for at least one configured guild covered by the
    /// session's own roles entry, the user belongs to the guild and holds
    /// any of its required roles.
    fn roles_grant_access(&self, session: &Session) -> bool {
        self.guilds.iter().any(|guild| {
            session.roles_in(&guild.id).is_some_and(|user_roles| {
                session.member_of(&guild.id)
                    && user_roles
                        .iter()
                        .any(|role| guild.required_roles.contains(role))
            })
        })
    }
}
