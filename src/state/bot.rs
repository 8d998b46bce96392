//! Bot records and trading strategy definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback when an interval string cannot be parsed (1 minute).
pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// What the evaluator decided to do with a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

/// Interval parameter: either raw milliseconds or a short-unit string
/// such as `"30s"`, `"5m"`, `"2h"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalSpec {
    Millis(u64),
    Text(String),
}

impl IntervalSpec {
    /// Resolve to milliseconds. Unrecognized strings fall back to
    /// [`DEFAULT_INTERVAL_MS`]; this is a defined default, not an error.
    pub fn as_millis(&self) -> u64 {
        match self {
            IntervalSpec::Millis(ms) => *ms,
            IntervalSpec::Text(text) => parse_interval_text(text).unwrap_or(DEFAULT_INTERVAL_MS),
        }
    }
}

/// Parse `^(\d+)([smh])$`.
fn parse_interval_text(text: &str) -> Option<u64> {
    let unit = text.chars().last()?;
    let digits = &text[..text.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let factor = match unit {
        's' => 1_000,
        'm' => 60_000,
        'h' => 3_600_000,
        _ => return None,
    };
    value.checked_mul(factor)
}

/// Rule set determining when a bot trades. Absent optional thresholds
/// mean the corresponding condition never triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    #[serde(rename_all = "camelCase")]
    PriceThreshold {
        #[serde(skip_serializing_if = "Option::is_none")]
        buy_threshold: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sell_threshold: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    PriceRange {
        #[serde(skip_serializing_if = "Option::is_none")]
        min_price: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_price: Option<f64>,
    },
    Interval {
        interval: IntervalSpec,
    },
    /// Extension point; always evaluates to hold.
    Custom,
}

/// Swap parameters forwarded to the execution API. The configured
/// direction is the buy direction; sells mirror it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapConfig {
    pub sender_address: String,
    pub sender_private_key: String,
    pub recipient_address: String,
    pub origin_symbol: String,
    pub origin_blockchain: String,
    pub destination_symbol: String,
    /// Defaults to the origin blockchain when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_blockchain: Option<String>,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage_tolerance: Option<String>,
}

impl SwapConfig {
    /// The sell-direction request: origin and destination symbol/chain
    /// swapped, amount unchanged.
    pub fn mirrored(&self) -> SwapConfig {
        SwapConfig {
            origin_symbol: self.destination_symbol.clone(),
            origin_blockchain: self
                .destination_blockchain
                .clone()
                .unwrap_or_else(|| self.origin_blockchain.clone()),
            destination_symbol: self.origin_symbol.clone(),
            destination_blockchain: Some(self.origin_blockchain.clone()),
            ..self.clone()
        }
    }
}

/// A named, independently activatable strategy + swap-config pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub id: Uuid,
    pub name: String,
    /// Feed symbol this bot trades on, e.g. "SOL".
    pub target_coin: String,
    pub strategy: Strategy,
    pub swap_config: SwapConfig,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_execution_at: Option<DateTime<Utc>>,
    pub execution_count: u64,
}

impl Bot {
    pub fn new(
        name: impl Into<String>,
        target_coin: impl Into<String>,
        strategy: Strategy,
        swap_config: SwapConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_coin: target_coin.into(),
            strategy,
            swap_config,
            is_active: false,
            created_at: Utc::now(),
            last_execution_at: None,
            execution_count: 0,
        }
    }
}
