//! Token symbol registry
//!
//! Lets quote requests name tokens by symbol ("WETH", "usdc") instead of
//! address. Symbols resolve per chain since the same symbol lives at a
//! different address on every network.

use alloy::primitives::{address, Address};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
}

impl TokenInfo {
    const fn new(symbol: &'static str, address: Address, decimals: u8) -> Self {
        Self {
            symbol,
            address,
            decimals,
        }
    }
}

/// Chain ID constants
pub mod chains {
    pub const ETHEREUM: u64 = 1;
    pub const ARBITRUM: u64 = 42161;
    pub const OPTIMISM: u64 = 10;
    pub const BASE: u64 = 8453;
}

/// Well-known token addresses per chain
pub mod addresses {
    use super::*;

    pub const USDC_ETH: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const USDT_ETH: Address = address!("dac17f958d2ee523a2206206994597c13d831ec7");
    pub const DAI_ETH: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    pub const WETH_ETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    pub const WBTC_ETH: Address = address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599");

    pub const USDC_ARB: Address = address!("af88d065e77c8cc2239327c5edb3a432268e5831");
    pub const USDT_ARB: Address = address!("fd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9");
    pub const WETH_ARB: Address = address!("82af49447d8a07e3bd95bd0d56f35241523fbab1");

    pub const USDC_OPT: Address = address!("0b2c639c533813f4aa9d7837caf62653d097ff85");
    pub const WETH_OPT: Address = address!("4200000000000000000000000000000000000006");

    pub const USDC_BASE: Address = address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913");
    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");

    /// Placeholder aggregators use for the chain's native asset
    pub const NATIVE_ETH: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");
}

pub struct TokenRegistry {
    tokens_per_chain: HashMap<u64, Vec<TokenInfo>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        use addresses::*;

        let mut tokens_per_chain = HashMap::new();
        tokens_per_chain.insert(
            chains::ETHEREUM,
            vec![
                TokenInfo::new("ETH", NATIVE_ETH, 18),
                TokenInfo::new("USDC", USDC_ETH, 6),
                TokenInfo::new("USDT", USDT_ETH, 6),
                TokenInfo::new("DAI", DAI_ETH, 18),
                TokenInfo::new("WETH", WETH_ETH, 18),
                TokenInfo::new("WBTC", WBTC_ETH, 8),
            ],
        );
        tokens_per_chain.insert(
            chains::ARBITRUM,
            vec![
                TokenInfo::new("ETH", NATIVE_ETH, 18),
                TokenInfo::new("USDC", USDC_ARB, 6),
                TokenInfo::new("USDT", USDT_ARB, 6),
                TokenInfo::new("WETH", WETH_ARB, 18),
            ],
        );
        tokens_per_chain.insert(
            chains::OPTIMISM,
            vec![
                TokenInfo::new("ETH", NATIVE_ETH, 18),
                TokenInfo::new("USDC", USDC_OPT, 6),
                TokenInfo::new("WETH", WETH_OPT, 18),
            ],
        );
        tokens_per_chain.insert(
            chains::BASE,
            vec![
                TokenInfo::new("ETH", NATIVE_ETH, 18),
                TokenInfo::new("USDC", USDC_BASE, 6),
                TokenInfo::new("WETH", WETH_BASE, 18),
            ],
        );

        Self { tokens_per_chain }
    }

    pub fn by_symbol(&self, chain_id: u64, symbol: &str) -> Option<&TokenInfo> {
        self.tokens_per_chain
            .get(&chain_id)?
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
    }

    pub fn by_address(&self, chain_id: u64, address: &Address) -> Option<&TokenInfo> {
        self.tokens_per_chain
            .get(&chain_id)?
            .iter()
            .find(|t| &t.address == address)
    }

    /// Resolve a `0x` address or a known symbol to an address on `chain_id`
    pub fn resolve(&self, chain_id: u64, token: &str) -> Option<Address> {
        let token = token.trim();
        if token.starts_with("0x") {
            return Address::from_str(token).ok();
        }
        self.by_symbol(chain_id, token).map(|t| t.address)
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: std::sync::OnceLock<TokenRegistry> = std::sync::OnceLock::new();

/// Get the global token registry
pub fn registry() -> &'static TokenRegistry {
    REGISTRY.get_or_init(TokenRegistry::new)
}
