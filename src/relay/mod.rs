//! Relay swap execution
//!
//! The core never constructs transactions itself; it hands a
//! [`SwapConfig`] to the [`SwapApi`] collaborator and records the
//! outcome. [`RelayClient`] is the production implementation.

pub mod assets;
pub mod client;

pub use client::RelayClient;

use anyhow::Result;
use async_trait::async_trait;

use crate::state::SwapConfig;

/// Result of one swap submission. `success` with a pending final status
/// means the swap was accepted and is settling.
#[derive(Debug, Clone, Default)]
pub struct SwapOutcome {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub request_id: Option<String>,
    pub error: Option<String>,
}

/// External swap execution service. Callers may retry at their own
/// discretion; implementations must be safe under at-least-once
/// submission.
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn execute_swap(&self, request: &SwapConfig) -> Result<SwapOutcome>;
}

/// Validate a swap configuration before accepting a bot. Returns every
/// problem found, empty when the config is usable.
pub fn validate_swap_config(config: &SwapConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.sender_address.is_empty() {
        errors.push("Sender address is required".to_string());
    }
    if config.sender_private_key.is_empty() {
        errors.push("Sender private key is required".to_string());
    }
    if config.recipient_address.is_empty() {
        errors.push("Recipient address is required".to_string());
    }
    if config.origin_symbol.is_empty() {
        errors.push("Origin token symbol is required".to_string());
    }
    if config.origin_blockchain.is_empty() {
        errors.push("Origin blockchain is required".to_string());
    } else if assets::chain_id(&config.origin_blockchain).is_none() {
        errors.push(format!(
            "Unsupported origin blockchain: {}",
            config.origin_blockchain
        ));
    }
    if config.destination_symbol.is_empty() {
        errors.push("Destination token symbol is required".to_string());
    }
    // Destination blockchain is optional; it defaults to the origin chain.
    if let Some(destination) = &config.destination_blockchain {
        if assets::chain_id(destination).is_none() {
            errors.push(format!("Unsupported destination blockchain: {destination}"));
        }
    }

    match config.amount.parse::<f64>() {
        Ok(amount) if amount > 0.0 => {}
        _ => errors.push("Valid amount is required".to_string()),
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SwapConfig {
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
    fn valid_config_passes() {
        assert!(validate_swap_config(&valid_config()).is_empty());
    }

    #[test]
    fn omitted_destination_chain_is_accepted() {
        let mut config = valid_config();
        config.destination_blockchain = None;
        assert!(validate_swap_config(&config).is_empty());
    }

    #[test]
    fn every_problem_is_reported() {
        let mut config = valid_config();
        config.sender_address.clear();
        config.origin_symbol.clear();
        config.amount = "0".into();

        let errors = validate_swap_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("Sender address")));
        assert!(errors.iter().any(|e| e.contains("Origin token symbol")));
        assert!(errors.iter().any(|e| e.contains("Valid amount")));
    }

    #[test]
    fn unsupported_chains_are_rejected() {
        let mut config = valid_config();
        config.origin_blockchain = "solana".into();
        config.destination_blockchain = Some("near".into());

        let errors = validate_swap_config(&config);
        assert!(errors
            .iter()
            .any(|e| e.contains("Unsupported origin blockchain: solana")));
        assert!(errors
            .iter()
            .any(|e| e.contains("Unsupported destination blockchain: near")));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let mut config = valid_config();
        config.amount = "lots".into();
        assert!(validate_swap_config(&config)
            .iter()
            .any(|e| e.contains("Valid amount")));
    }
}
