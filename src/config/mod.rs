//! Configuration management
//!
//! This module handles loading and parsing configuration for the alertdash
//! dashboard. Configuration can be loaded from:
//! - config.yml file
//!
//! Missing optional values are filled with sensible defaults. The Discord
//! section (application credentials and the per-guild access requirements)
//! has no meaningful defaults and is expected to be present in deployments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Discord application and guild configuration
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Discord application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// OAuth application client id
    #[serde(default)]
    pub client_id: String,
    /// OAuth application client secret
    #[serde(default)]
    pub client_secret: String,
    /// Bot token used to fetch guild member roles
    #[serde(default)]
    pub bot_token: String,
    /// OAuth redirect URI registered with the application
    #[serde(default)]
    pub redirect_uri: String,
    /// User ids that bypass the guild/role checks entirely
    #[serde(default)]
    pub user_id_whitelist: Vec<String>,
    /// Guilds the dashboard serves, with their access requirements
    #[serde(default)]
    pub guilds: Vec<GuildConfig>,
}

/// Access requirements for one Discord guild
///
/// `required_roles` is an any-of match: holding one of the listed role
/// names grants access. `geofences` is the guild's valid area names; the
/// order is preserved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildConfig {
    /// Discord guild (server) id
    pub id: String,
    /// Role names that grant dashboard access
    #[serde(default)]
    pub required_roles: Vec<String>,
    /// Geofence (area) names valid for this guild
    #[serde(default)]
    pub geofences: Vec<String>,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session time-to-live in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of concurrently cached sessions
    #[serde(default = "default_session_capacity")]
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
            max_sessions: default_session_capacity(),
        }
    }
}

fn default_session_ttl() -> u64 {
    86400
}

fn default_session_capacity() -> u64 {
    10_000
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(config)
    }
}

/// Static lookup over the configured guilds
///
/// Built once at process start from `DiscordConfig::guilds` and shared
/// read-only across requests.
#[derive(Debug)]
pub struct GuildCatalog {
    guilds: Vec<GuildConfig>,
    by_id: HashMap<String, usize>,
}

impl GuildCatalog {
    /// Build a catalog from configured guilds
    ///
    /// On duplicate guild ids the first entry wins, matching the original
    /// first-match lookup semantics.
    pub fn new(guilds: Vec<GuildConfig>) -> Self {
        let mut by_id = HashMap::with_capacity(guilds.len());
        for (idx, guild) in guilds.iter().enumerate() {
            by_id.entry(guild.id.clone()).or_insert(idx);
        }
        Self { guilds, by_id }
    }

    /// Build a shared catalog straight from the Discord config section
    pub fn from_config(discord: &DiscordConfig) -> Arc<Self> {
        Arc::new(Self::new(discord.guilds.clone()))
    }

    /// Look up a guild's requirements by id
    pub fn lookup(&self, guild_id: &str) -> Option<&GuildConfig> {
        self.by_id.get(guild_id).map(|&idx| &self.guilds[idx])
    }

    /// Iterate over all configured guilds
    pub fn iter(&self) -> impl Iterator<Item = &GuildConfig> {
        self.guilds.iter()
    }

    /// Whether any of the given guild ids is served by this dashboard
    pub fn serves_any(&self, guild_ids: &[String]) -> bool {
        guild_ids.iter().any(|id| self.by_id.contains_key(id))
    }

    /// Number of configured guilds
    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    /// Whether no guilds are configured
    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }
}
