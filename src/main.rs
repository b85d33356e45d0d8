mod config;
mod dispatcher;
mod error;
mod identity;
mod lifecycle;
mod normalize;
mod platform;
mod registry;
mod server;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::telegram::{self, TelegramPlatform};
use crate::platform::ChatPlatform;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-v" || a == "--version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,maintbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    info!(
        "config: {}",
        serde_json::to_string_pretty(&config.redacted()).context("Failed to format config")?
    );

    let client = telegram::http_client(config.telegram_timeout_seconds)?;
    let mut clients: BTreeMap<String, Arc<dyn ChatPlatform>> = BTreeMap::new();
    for (name, endpoint) in &config.endpoints {
        clients.insert(
            name.clone(),
            Arc::new(TelegramPlatform::new(&endpoint.bot_token, client.clone())),
        );
    }

    let shutdown = lifecycle::shutdown_signal().context("Failed to install signal handlers")?;

    info!("Bot is starting in maintenance mode...");
    lifecycle::run(&config, clients, shutdown).await?;

    Ok(())
}
