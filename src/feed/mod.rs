//! Market data feed abstraction
//!
//! A feed maintains one streaming subscription per symbol and delivers
//! normalized price ticks over a channel. Implementations own their
//! reconnect policy; consumers only see ticks and a terminal error event
//! when the feed gives up.

pub mod hyperliquid;

pub use hyperliquid::HyperliquidFeed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One normalized price observation from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub symbol: String,
}

/// Events delivered over a feed subscription.
#[derive(Debug)]
pub enum FeedEvent {
    Tick(PriceTick),
    /// The feed gave up; no further ticks will arrive on this subscription.
    Terminated(FeedError),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket connect failed: {0}")]
    Connect(String),

    #[error("websocket protocol error: {0}")]
    Protocol(String),

    #[error("gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

/// A live subscription: a stream of [`FeedEvent`]s backed by a background
/// task. Dropping the subscription tears the task down.
pub struct FeedSubscription {
    events: mpsc::Receiver<FeedEvent>,
    task: JoinHandle<()>,
}

impl FeedSubscription {
    pub fn new(events: mpsc::Receiver<FeedEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }

    /// Next event, or `None` once the feed task has hung up.
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Streaming market-data source.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Open a streaming subscription for one symbol.
    async fn subscribe(&self, symbol: &str) -> Result<FeedSubscription, FeedError>;
}
