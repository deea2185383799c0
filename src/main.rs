//! Alertdash - Web dashboard for managing Discord notification subscriptions

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alertdash::{
    api::{self, AppState},
    config::{Config, GuildCatalog},
    services::{AccessGate, AreaService, DiscordClient},
    session::MemorySessionStore,
    store::MemorySubscriptionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alertdash=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting alertdash...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!(
        guilds = config.discord.guilds.len(),
        "Configuration loaded"
    );

    // Build the shared guild catalog and session store
    let guilds = GuildCatalog::from_config(&config.discord);
    let sessions = Arc::new(MemorySessionStore::from_config(&config.session));

    // Build application state
    let discord_config = Arc::new(config.discord.clone());
    let state = AppState {
        gate: Arc::new(AccessGate::new(sessions.clone(), guilds.clone())),
        sessions,
        areas: Arc::new(AreaService::new(guilds.clone())),
        discord: Arc::new(DiscordClient::new(config.discord.clone())),
        subscriptions: Arc::new(MemorySubscriptionStore::new()),
        guilds,
        discord_config,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
