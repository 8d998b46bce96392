//! Supported chains and tokens for Relay swaps
//!
//! Kept as plain lookup data so adding a chain or token is a table edit,
//! not a code fork.

/// Relay chain id for a blockchain name, case-insensitive.
pub fn chain_id(blockchain: &str) -> Option<u64> {
    let id = match blockchain.to_ascii_lowercase().as_str() {
        "ethereum" => 1,
        "optimism" => 10,
        "bsc" => 56,
        "polygon" => 137,
        "base" => 8453,
        "arbitrum" => 42161,
        "avalanche" => 43114,
        _ => return None,
    };
    Some(id)
}

/// Contract address for a token symbol on a chain. The zero address
/// denotes the chain's native asset.
pub fn token_address(chain_id: u64, symbol: &str) -> Option<&'static str> {
    const NATIVE: &str = "0x0000000000000000000000000000000000000000";

    let address = match (chain_id, symbol.to_ascii_uppercase().as_str()) {
        (1, "ETH") => NATIVE,
        (1, "USDC") => "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
        (1, "USDT") => "0xdac17f958d2ee523a2206206994597c13d831ec7",
        (1, "WETH") => "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        (1, "WBTC") => "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599",
        (1, "DAI") => "0x6b175474e89094c44da98b954eedeac495271d0f",

        (10, "ETH") => NATIVE,
        (10, "USDC") => "0x0b2c639c533813f4aa9d7837caf62653d097ff85",
        (10, "USDT") => "0x94b008aa00579c1307b0ef2c499ad98a8ce58e58",
        (10, "WETH") => "0x4200000000000000000000000000000000000006",
        (10, "OP") => "0x4200000000000000000000000000000000000042",

        (56, "BNB") => NATIVE,
        (56, "USDC") => "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d",
        (56, "USDT") => "0x55d398326f99059ff775485246999027b3197955",
        (56, "WBNB") => "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c",

        (137, "POL") | (137, "MATIC") => NATIVE,
        (137, "USDC") => "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359",
        (137, "USDT") => "0xc2132d05d31c914a87c6611c10748aeb04b58e8f",
        (137, "WETH") => "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619",

        (8453, "ETH") => NATIVE,
        (8453, "USDC") => "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
        (8453, "WETH") => "0x4200000000000000000000000000000000000006",
        (8453, "CBBTC") => "0xcbb7c0000ab88b473b1f5afd9ef808440eed33bf",

        (42161, "ETH") => NATIVE,
        (42161, "USDC") => "0xaf88d065e77c8cc2239327c5edb3a432268e5831",
        (42161, "USDT") => "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9",
        (42161, "WETH") => "0x82af49447d8a07e3bd95bd0d56f35241523fbab1",
        (42161, "ARB") => "0x912ce59144191c1204e64559fe8253a0e49e6548",

        (43114, "AVAX") => NATIVE,
        (43114, "USDC") => "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e",
        (43114, "USDT") => "0x9702230a8ea53601f5cd2dc00fdbc13d4df4a8c7",

        _ => return None,
    };
    Some(address)
}

/// Decimal places for a token symbol; chains agree for the tokens we
/// route, so this keys on symbol alone.
pub fn token_decimals(symbol: &str) -> u32 {
    match symbol.to_ascii_uppercase().as_str() {
        "USDC" | "USDT" => 6,
        "WBTC" | "CBBTC" => 8,
        _ => 18,
    }
}

/// Scale a human-readable decimal amount to base units. Amounts without
/// a decimal point are already base units and pass through at the call
/// site; this handles the fractional form.
pub fn to_base_units(amount: &str, decimals: u32) -> Option<String> {
    let (int_part, frac_part) = match amount.split_once('.') {
        Some(parts) => parts,
        None => (amount, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let decimals = decimals as usize;
    let mut frac = frac_part.to_string();
    frac.truncate(decimals);
    while frac.len() < decimals {
        frac.push('0');
    }

    let combined = format!("{int_part}{frac}");
    let trimmed = combined.trim_start_matches('0');
    Some(if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    })
}
