//! Discord API client
//!
//! Thin client for the three Discord interactions the dashboard needs:
//! the OAuth2 authorization-code exchange, the identity/guild lookups made
//! with the user's access token, and the member-role lookups made with the
//! bot token. Only the shapes of the returned data matter here; everything
//! else about the Discord API stays behind this module.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::DiscordConfig;

const API_BASE: &str = "https://discord.com/api";
const OAUTH_SCOPE: &str = "guilds identify email";

/// Discord user identity, as returned by `/users/@me`
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub discriminator: String,
}

impl DiscordUser {
    /// Display name in the `name#discriminator` form the dashboard shows
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PartialGuild {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GuildMember {
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GuildRole {
    id: String,
    name: String,
}

/// Client for the Discord OAuth and REST endpoints
pub struct DiscordClient {
    http: reqwest::Client,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// The authorization URL the login endpoint redirects to
    pub fn authorize_url(&self) -> String {
        format!(
            "{}/oauth2/authorize?client_id={}&scope={}&response_type=code&redirect_uri={}",
            API_BASE,
            self.config.client_id,
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(&self.config.redirect_uri),
        )
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", OAUTH_SCOPE),
        ];

        let response: TokenResponse = self
            .http
            .post(format!("{API_BASE}/oauth2/token"))
            .form(&params)
            .send()
            .await
            .context("Failed to reach the Discord token endpoint")?
            .error_for_status()
            .context("Discord rejected the authorization code")?
            .json()
            .await
            .context("Failed to decode the token response")?;

        Ok(response.access_token)
    }

    /// Fetch the logged-in user's identity
    pub async fn fetch_user(&self, access_token: &str) -> Result<DiscordUser> {
        self.http
            .get(format!("{API_BASE}/users/@me"))
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to fetch the Discord user")?
            .error_for_status()
            .context("Discord rejected the access token")?
            .json()
            .await
            .context("Failed to decode the user response")
    }

    /// Fetch the ids of the guilds the user belongs to
    pub async fn fetch_guilds(&self, access_token: &str) -> Result<Vec<String>> {
        let guilds: Vec<PartialGuild> = self
            .http
            .get(format!("{API_BASE}/users/@me/guilds"))
            .bearer_auth(access_token)
            .send()
            .await
            .context("Failed to fetch the user's guilds")?
            .error_for_status()
            .context("Discord rejected the guild listing request")?
            .json()
            .await
            .context("Failed to decode the guild listing")?;

        Ok(guilds.into_iter().map(|g| g.id).collect())
    }

    /// Fetch the role names a user holds in one guild
    ///
    /// Members carry role ids; the guild role listing maps them to the
    /// names the access requirements are written in. Both lookups use the
    /// bot token.
    pub async fn fetch_member_role_names(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Vec<String>> {
        let member: GuildMember = self
            .bot_get(&format!("{API_BASE}/guilds/{guild_id}/members/{user_id}"))
            .await
            .context("Failed to fetch the guild member")?;

        let roles: Vec<GuildRole> = self
            .bot_get(&format!("{API_BASE}/guilds/{guild_id}/roles"))
            .await
            .context("Failed to fetch the guild roles")?;

        let names_by_id: HashMap<String, String> =
            roles.into_iter().map(|r| (r.id, r.name)).collect();

        Ok(member
            .roles
            .into_iter()
            .filter_map(|id| names_by_id.get(&id).cloned())
            .collect())
    }

    /// Build the per-guild role-name map stored on the session
    pub async fn build_guild_roles(
        &self,
        user_id: &str,
        guild_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>> {
        let mut roles = HashMap::with_capacity(guild_ids.len());
        for guild_id in guild_ids {
            let names = self.fetch_member_role_names(guild_id, user_id).await?;
            roles.insert(guild_id.clone(), names);
        }
        Ok(roles)
    }

    async fn bot_get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.http
            .get(url)
            .header("Authorization", format!("Bot {}", self.config.bot_token))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(Into::into)
    }
}
