//! Relay Trading Bot
//!
//! Orchestrates automated trading bots: live prices stream in from the
//! Hyperliquid WebSocket, strategies decide buy/sell/hold per tick, and
//! trades go out as cross-chain swaps through the Relay API.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod engine;
mod feed;
mod relay;
mod state;
mod storage;

use config::Config;
use feed::HyperliquidFeed;
use relay::RelayClient;
use state::{BotRegistry, NewBotRequest};
use storage::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("🚀 Starting Relay trading bot engine...");

    // Load configuration
    let config = Config::from_env();

    info!("✅ Configuration loaded successfully");
    info!("📡 Price feed: {}", config.hyperliquid_ws_url);
    info!("🔄 Swap API: {}", config.relay_api_url);
    info!("🎯 Default coin: {}", config.default_coin);

    // Wire collaborators into the registry
    let feed = Arc::new(HyperliquidFeed::new(
        &config.hyperliquid_ws_url,
        config.feed_reconnect_delay(),
        config.feed_max_reconnect_attempts,
    ));
    let swap = Arc::new(
        RelayClient::new(&config.relay_api_url, config.relay_api_key.clone())
            .with_status_polling(config.status_poll_interval(), config.status_poll_attempts),
    );
    let store = Arc::new(JsonFileStore::new(&config.data_dir)?);

    let registry = Arc::new(BotRegistry::new(
        feed,
        swap,
        store,
        &config.default_coin,
        config.swap_timeout(),
    ));

    // Bring persisted bots back, then apply any seed definitions
    let reactivated = registry.restore().await;
    if let Some(path) = &config.bot_definitions {
        seed_bots(registry.as_ref(), path).await?;
    }

    let stats = registry.stats();
    info!(
        "✅ Registry initialized: {} bots loaded, {} active, {} reactivated",
        stats.total_bots, stats.active_bots, reactivated
    );

    // Periodic status report while the engine runs
    let status_registry = registry.clone();
    let status_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let stats = status_registry.stats();
            let last_price = status_registry
                .recent_prices(1)
                .first()
                .map(|tick| format!("{} @ {}", tick.symbol, tick.price))
                .unwrap_or_else(|| "no ticks yet".to_string());
            info!(
                "📊 {} bots ({} active), {} executions, {} log entries, last price: {}",
                stats.total_bots,
                stats.active_bots,
                stats.total_executions,
                stats.logged_entries,
                last_price
            );
        }
    });

    // Wait for shutdown signal
    info!("🎯 Bot engine is running. Press Ctrl+C to stop.");
    shutdown_signal().await;

    info!("🛑 Shutdown signal received, stopping bots...");

    // Cleanup: deactivating flushes bot state through the store
    status_handle.abort();
    registry.shutdown().await;

    info!("👋 Bot engine stopped gracefully");
    Ok(())
}

/// Create and optionally activate bots from a JSON definitions file.
/// Definitions whose name already exists are skipped, so the file is
/// safe to leave in place across restarts.
async fn seed_bots(registry: &BotRegistry, path: &str) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bot definitions from {path}"))?;
    let definitions: Vec<NewBotRequest> =
        serde_json::from_str(&raw).context("Failed to parse bot definitions")?;

    let existing: Vec<String> = registry.all_bots().into_iter().map(|b| b.name).collect();

    for definition in definitions {
        if existing.contains(&definition.name) {
            info!(bot = %definition.name, "seed definition already exists, skipping");
            continue;
        }
        let auto_start = definition.auto_start;
        match registry.create_bot(definition).await {
            Ok(bot) => {
                if auto_start {
                    if let Err(err) = registry.activate_bot(bot.id).await {
                        error!(bot = %bot.name, "failed to activate seeded bot: {err}");
                    }
                }
            }
            Err(err) => warn!("skipping invalid bot definition: {err}"),
        }
    }
    Ok(())
}

/// Initialize the logging system
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,relay_trading_bot=debug"));

    let json_logging = std::env::var("LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
