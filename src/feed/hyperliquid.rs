//! Hyperliquid WebSocket price feed
//!
//! Subscribes to the public `trades` channel for a single coin and
//! normalizes each fill into a [`PriceTick`]. Reconnects with a fixed
//! delay and a bounded attempt count; on exhaustion the subscription
//! receives a terminal [`FeedEvent::Terminated`] and the task exits.

use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::{FeedError, FeedEvent, FeedSubscription, PriceFeed, PriceTick};

pub const MAINNET_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";
pub const TESTNET_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";

/// Channel capacity for in-flight ticks before the producer awaits.
const TICK_BUFFER: usize = 256;

pub struct HyperliquidFeed {
    ws_url: String,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
}

impl HyperliquidFeed {
    pub fn new(
        ws_url: impl Into<String>,
        reconnect_delay: Duration,
        max_reconnect_attempts: u32,
    ) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect_delay,
            max_reconnect_attempts,
        }
    }
}

#[async_trait::async_trait]
impl PriceFeed for HyperliquidFeed {
    async fn subscribe(&self, symbol: &str) -> Result<FeedSubscription, FeedError> {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let url = self.ws_url.clone();
        let symbol = symbol.to_string();
        let delay = self.reconnect_delay;
        let max_attempts = self.max_reconnect_attempts;

        let task = tokio::spawn(async move {
            stream_trades(url, symbol, tx, delay, max_attempts).await;
        });

        Ok(FeedSubscription::new(rx, task))
    }
}

/// How a single websocket session ended.
enum SessionEnd {
    /// The subscription receiver was dropped; stop for good.
    ReceiverClosed,
    /// Connection dropped after a successful subscribe; reconnect.
    Disconnected(String),
}

async fn stream_trades(
    url: String,
    symbol: String,
    tx: mpsc::Sender<FeedEvent>,
    reconnect_delay: Duration,
    max_attempts: u32,
) {
    let mut attempts: u32 = 0;

    loop {
        match run_session(&url, &symbol, &tx).await {
            Ok(SessionEnd::ReceiverClosed) => {
                debug!(%symbol, "subscription dropped, closing price feed");
                return;
            }
            Ok(SessionEnd::Disconnected(reason)) => {
                // A completed session restarts the attempt counter.
                attempts = 0;
                warn!(%symbol, %reason, "price feed disconnected");
            }
            Err(err) => {
                attempts += 1;
                warn!(
                    %symbol,
                    attempt = attempts,
                    max = max_attempts,
                    "price feed connection failed: {err}"
                );
                if attempts >= max_attempts {
                    error!(%symbol, "max reconnection attempts reached, price feed terminated");
                    let _ = tx
                        .send(FeedEvent::Terminated(FeedError::ReconnectExhausted {
                            attempts,
                        }))
                        .await;
                    return;
                }
            }
        }

        debug!(%symbol, "reconnecting in {:?}", reconnect_delay);
        sleep(reconnect_delay).await;
    }
}

async fn run_session(
    url: &str,
    symbol: &str,
    tx: &mpsc::Sender<FeedEvent>,
) -> Result<SessionEnd, FeedError> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| FeedError::Connect(e.to_string()))?;
    let (mut sink, mut stream) = ws.split();

    sink.send(Message::Text(subscribe_frame(symbol).to_string()))
        .await
        .map_err(|e| FeedError::Protocol(e.to_string()))?;

    info!(%symbol, "connected to Hyperliquid, subscribing to trades");

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(txt)) => {
                for tick in parse_frame(&txt, symbol) {
                    if tx.send(FeedEvent::Tick(tick)).await.is_err() {
                        let _ = sink
                            .send(Message::Text(unsubscribe_frame(symbol).to_string()))
                            .await;
                        return Ok(SessionEnd::ReceiverClosed);
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = sink.send(Message::Pong(payload)).await;
            }
            Ok(Message::Close(_)) => {
                return Ok(SessionEnd::Disconnected("server closed connection".into()));
            }
            Ok(_) => {}
            Err(err) => return Ok(SessionEnd::Disconnected(err.to_string())),
        }
    }

    Ok(SessionEnd::Disconnected("stream ended".into()))
}

fn subscribe_frame(symbol: &str) -> serde_json::Value {
    json!({
        "method": "subscribe",
        "subscription": { "type": "trades", "coin": symbol }
    })
}

fn unsubscribe_frame(symbol: &str) -> serde_json::Value {
    json!({
        "method": "unsubscribe",
        "subscription": { "type": "trades", "coin": symbol }
    })
}

#[derive(Debug, Deserialize)]
struct WsFrame {
    channel: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WsTrade {
    coin: String,
    px: String,
    time: i64,
}

/// Extract all valid ticks from one raw frame. Subscription confirmations
/// and malformed trades are logged and skipped, never fatal.
fn parse_frame(raw: &str, symbol: &str) -> Vec<PriceTick> {
    let frame: WsFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(err) => {
            debug!("unparseable feed frame: {err}");
            return Vec::new();
        }
    };

    match frame.channel.as_str() {
        "subscriptionResponse" => {
            info!(%symbol, "trade subscription confirmed");
            Vec::new()
        }
        "trades" => {
            let trades: Vec<WsTrade> = match serde_json::from_value(frame.data) {
                Ok(trades) => trades,
                Err(err) => {
                    debug!("unparseable trades payload: {err}");
                    return Vec::new();
                }
            };
            trades.iter().filter_map(normalize_trade).collect()
        }
        other => {
            debug!(channel = other, "ignoring feed frame");
            Vec::new()
        }
    }
}

fn normalize_trade(trade: &WsTrade) -> Option<PriceTick> {
    let price: f64 = trade.px.parse().ok()?;
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let timestamp = DateTime::<Utc>::from_timestamp_millis(trade.time).unwrap_or_else(Utc::now);
    Some(PriceTick {
        timestamp,
        price,
        symbol: trade.coin.clone(),
    })
}
