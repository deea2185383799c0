//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server-held session state, keyed by an opaque session id
///
/// Created on a successful OAuth callback and mutated only by the login
/// flow. Anonymous sessions exist solely to remember the path a logged-out
/// visitor tried to reach, so the login flow can redirect back afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Whether the OAuth login flow completed for this session
    pub logged_in: bool,
    /// Discord user id
    pub user_id: String,
    /// Discord username (name#discriminator)
    pub username: String,
    /// Ids of the guilds the user belongs to
    pub guilds: Vec<String>,
    /// Role names the user holds, per guild id
    pub roles: HashMap<String, Vec<String>>,
    /// Authorization verdict cached at login time
    pub valid: bool,
    /// Last denied path, for the post-login redirect
    pub current_path: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create an anonymous session recording the path that was denied
    pub fn anonymous(current_path: impl Into<String>) -> Self {
        Self {
            logged_in: false,
            user_id: String::new(),
            username: String::new(),
            guilds: Vec::new(),
            roles: HashMap::new(),
            valid: false,
            current_path: Some(current_path.into()),
            created_at: Utc::now(),
        }
    }

    /// Role names the user holds in the given guild, if any were recorded
    pub fn roles_in(&self, guild_id: &str) -> Option<&[String]> {
        self.roles.get(guild_id).map(|r| r.as_slice())
    }

    /// Whether the user belongs to the given guild
    pub fn member_of(&self, guild_id: &str) -> bool {
        self.guilds.iter().any(|g| g == guild_id)
    }
}
