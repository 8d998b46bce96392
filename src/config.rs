//! Configuration module for the bot engine

use std::time::Duration;

use crate::feed::hyperliquid::{MAINNET_WS_URL, TESTNET_WS_URL};
use crate::relay::client::DEFAULT_API_URL;

/// Runtime configuration, loaded from the environment with sensible
/// defaults for every field. Nothing here is required: the engine runs
/// against public endpoints out of the box.
#[derive(Debug, Clone)]
pub struct Config {
    // Market data
    pub hyperliquid_ws_url: String,
    pub default_coin: String,

    // Relay configuration
    pub relay_api_url: String,
    pub relay_api_key: Option<String>,

    // Persistence
    pub data_dir: String,
    /// Optional JSON file with bot definitions to seed at startup.
    pub bot_definitions: Option<String>,

    // Feed resilience
    pub feed_reconnect_delay_ms: u64,
    pub feed_max_reconnect_attempts: u32,

    // Swap execution
    pub swap_timeout_ms: u64,
    pub status_poll_interval_ms: u64,
    pub status_poll_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let testnet = std::env::var("HYPERLIQUID_TESTNET")
            .map(|v| v == "true")
            .unwrap_or(false);
        let default_ws_url = if testnet {
            TESTNET_WS_URL
        } else {
            MAINNET_WS_URL
        };

        Config {
            hyperliquid_ws_url: std::env::var("HYPERLIQUID_WS_URL")
                .unwrap_or_else(|_| default_ws_url.to_string()),
            default_coin: std::env::var("TARGET_COIN").unwrap_or_else(|_| "SOL".to_string()),

            relay_api_url: std::env::var("RELAY_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            relay_api_key: std::env::var("RELAY_API_KEY").ok(),

            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            bot_definitions: std::env::var("BOT_DEFINITIONS").ok(),

            feed_reconnect_delay_ms: env_u64("FEED_RECONNECT_DELAY_MS", 5_000),
            feed_max_reconnect_attempts: std::env::var("FEED_MAX_RECONNECT_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            swap_timeout_ms: env_u64("SWAP_TIMEOUT_MS", 330_000),
            status_poll_interval_ms: env_u64("STATUS_POLL_INTERVAL_MS", 15_000),
            status_poll_attempts: std::env::var("STATUS_POLL_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        }
    }

    pub fn feed_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.feed_reconnect_delay_ms)
    }

    pub fn swap_timeout(&self) -> Duration {
        Duration::from_millis(self.swap_timeout_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
