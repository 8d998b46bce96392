//! Relay REST client
//!
//! Pass-through integration: request a quote for the configured pair,
//! then poll the intent status endpoint until the swap settles or the
//! poll budget runs out. A swap still pending when polling stops counts
//! as submitted; the executor's timeout is the hard bound.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{assets, SwapApi, SwapOutcome};
use crate::state::SwapConfig;

pub const DEFAULT_API_URL: &str = "https://api.relay.link";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RelayClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    status_poll_interval: Duration,
    status_poll_attempts: u32,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            api_key,
            status_poll_interval: Duration::from_secs(15),
            status_poll_attempts: 20,
        }
    }

    pub fn with_status_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.status_poll_interval = interval;
        self.status_poll_attempts = attempts;
        self
    }

    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse> {
        let url = format!("{}/quote", self.base_url);
        debug!(%url, "requesting Relay quote");

        let mut req = self.http.post(&url).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.context("Failed to send quote request")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Relay quote failed: {status} - {body}");
        }

        response
            .json::<QuoteResponse>()
            .await
            .context("Failed to parse quote response")
    }

    async fn fetch_status(&self, request_id: &str) -> Result<StatusResponse> {
        let url = format!("{}/intents/status", self.base_url);

        let mut req = self.http.get(&url).query(&[("requestId", request_id)]);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.context("Failed to check swap status")?;
        if !response.status().is_success() {
            let status = response.status();
            bail!("Status check failed: {status}");
        }

        response
            .json::<StatusResponse>()
            .await
            .context("Failed to parse status response")
    }
}

#[async_trait]
impl SwapApi for RelayClient {
    async fn execute_swap(&self, request: &SwapConfig) -> Result<SwapOutcome> {
        info!(
            "executing swap: {} {} ({}) -> {} ({})",
            request.amount,
            request.origin_symbol,
            request.origin_blockchain,
            request.destination_symbol,
            request
                .destination_blockchain
                .as_deref()
                .unwrap_or(&request.origin_blockchain),
        );

        let quote_request = build_quote_request(request)?;
        let quote = self.fetch_quote(&quote_request).await?;

        let request_id = quote
            .steps
            .first()
            .and_then(|step| step.request_id.clone())
            .context("No execution steps returned from quote")?;

        info!(%request_id, "swap accepted, polling for completion");

        let mut last_tx_hash = None;
        for attempt in 1..=self.status_poll_attempts {
            sleep(self.status_poll_interval).await;

            let status = match self.fetch_status(&request_id).await {
                Ok(status) => status,
                Err(err) => {
                    warn!(attempt, "status check failed: {err:#}");
                    continue;
                }
            };

            if status.tx_hash.is_some() {
                last_tx_hash = status.tx_hash.clone();
            }

            match status.status.as_deref().unwrap_or("pending") {
                "success" => {
                    info!(%request_id, tx = ?last_tx_hash, "swap completed");
                    return Ok(SwapOutcome {
                        success: true,
                        tx_hash: last_tx_hash,
                        request_id: Some(request_id),
                        error: None,
                    });
                }
                "failure" => {
                    let reason = status
                        .error
                        .unwrap_or_else(|| "swap execution failed".to_string());
                    warn!(%request_id, %reason, "swap failed");
                    return Ok(SwapOutcome {
                        success: false,
                        tx_hash: last_tx_hash,
                        request_id: Some(request_id),
                        error: Some(reason),
                    });
                }
                other => debug!(%request_id, attempt, status = other, "swap still settling"),
            }
        }

        // Still pending; the intent was accepted so treat it as submitted.
        info!(%request_id, "status polling exhausted with swap pending");
        Ok(SwapOutcome {
            success: true,
            tx_hash: last_tx_hash,
            request_id: Some(request_id),
            error: None,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest {
    user: String,
    recipient: String,
    origin_chain_id: u64,
    destination_chain_id: u64,
    origin_currency: String,
    destination_currency: String,
    amount: String,
    trade_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    slippage_tolerance: Option<String>,
    // Same-chain swaps carry the extra routing flags; cross-chain quotes
    // reject them.
    #[serde(skip_serializing_if = "Option::is_none")]
    refund_on_origin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topup_gas: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_external_liquidity: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_fallbacks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    protocol_version: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    steps: Vec<QuoteStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteStep {
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: Option<String>,
    tx_hash: Option<String>,
    error: Option<String>,
}

fn build_quote_request(request: &SwapConfig) -> Result<QuoteRequest> {
    let origin_chain_id = assets::chain_id(&request.origin_blockchain)
        .with_context(|| format!("Unsupported blockchain: {}", request.origin_blockchain))?;
    let destination_chain_id = match &request.destination_blockchain {
        Some(chain) => assets::chain_id(chain)
            .with_context(|| format!("Unsupported blockchain: {chain}"))?,
        None => origin_chain_id,
    };

    let origin_currency = assets::token_address(origin_chain_id, &request.origin_symbol)
        .with_context(|| {
            format!(
                "Unsupported token {} on {}",
                request.origin_symbol, request.origin_blockchain
            )
        })?;
    let destination_currency =
        assets::token_address(destination_chain_id, &request.destination_symbol).with_context(
            || {
                format!(
                    "Unsupported token {} on chain {destination_chain_id}",
                    request.destination_symbol
                )
            },
        )?;

    // Fractional amounts are human units and scale by token decimals;
    // plain integers are already base units.
    let amount = if request.amount.contains('.') {
        let decimals = assets::token_decimals(&request.origin_symbol);
        assets::to_base_units(&request.amount, decimals)
            .with_context(|| format!("Invalid amount: {}", request.amount))?
    } else {
        request.amount.clone()
    };

    let same_chain = origin_chain_id == destination_chain_id;
    let flag = |enabled: bool| if enabled { Some(true) } else { None };

    Ok(QuoteRequest {
        user: request.sender_address.clone(),
        recipient: request.recipient_address.clone(),
        origin_chain_id,
        destination_chain_id,
        origin_currency: origin_currency.to_string(),
        destination_currency: destination_currency.to_string(),
        amount,
        trade_type: "EXACT_INPUT",
        slippage_tolerance: request.slippage_tolerance.clone(),
        refund_on_origin: flag(same_chain),
        topup_gas: flag(same_chain),
        use_external_liquidity: flag(same_chain),
        use_fallbacks: flag(same_chain),
        protocol_version: same_chain.then_some("v1"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swap_config() -> SwapConfig {
        SwapConfig {
            sender_address: "0xsender".into(),
            sender_private_key: "0xkey".into(),
            recipient_address: "0xrecipient".into(),
            origin_symbol: "USDC".into(),
            origin_blockchain: "polygon".into(),
            destination_symbol: "ETH".into(),
            destination_blockchain: Some("base".into()),
            amount: "1.5".into(),
            slippage_tolerance: None,
        }
    }

    #[test]
    fn cross_chain_quote_maps_chains_and_currencies() {
        let quote = build_quote_request(&swap_config()).unwrap();

        assert_eq!(quote.origin_chain_id, 137);
        assert_eq!(quote.destination_chain_id, 8453);
        assert_eq!(quote.amount, "1500000"); // 1.5 USDC at 6 decimals
        assert_eq!(quote.trade_type, "EXACT_INPUT");
        // Cross-chain quotes omit the same-chain routing flags.
        assert!(quote.refund_on_origin.is_none());
        assert!(quote.protocol_version.is_none());
    }

    #[test]
    fn same_chain_quote_sets_routing_flags() {
        let mut config = swap_config();
        config.destination_blockchain = None;
        config.destination_symbol = "WETH".into();

        let quote = build_quote_request(&config).unwrap();
        assert_eq!(quote.origin_chain_id, quote.destination_chain_id);
        assert_eq!(quote.refund_on_origin, Some(true));
        assert_eq!(quote.use_fallbacks, Some(true));
        assert_eq!(quote.protocol_version, Some("v1"));
    }

    #[test]
    fn integer_amounts_pass_through_unscaled() {
        let mut config = swap_config();
        config.amount = "1500000".into();

        let quote = build_quote_request(&config).unwrap();
        assert_eq!(quote.amount, "1500000");
    }

    #[test]
    fn unsupported_pairs_error_out() {
        let mut config = swap_config();
        config.origin_blockchain = "solana".into();
        assert!(build_quote_request(&config).is_err());

        let mut config = swap_config();
        config.destination_symbol = "DOGE".into();
        assert!(build_quote_request(&config).is_err());
    }
}
