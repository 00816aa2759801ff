//! Typed arguments of the local functions
//!
//! Field doc comments are what the reasoner sees as parameter descriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Arguments shared by every per-trader metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TraderArgs {
    /// Wallet address of the trader
    pub address: String,
    /// Look-back window in days, 7 when omitted
    #[serde(default)]
    pub duration: Option<u32>,
    /// Timezone used to bucket trades: UTC or CST, case-insensitive
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmartMoneyArgs {
    /// Look-back window in days, at least 7
    #[serde(default)]
    pub duration: Option<u32>,
    /// Timezone used to bucket trades: UTC or CST, case-insensitive (default CST)
    #[serde(default)]
    pub timezone: Option<String>,
    /// Minimum win rate in percent, 60 when omitted
    #[serde(default)]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwapQuoteArgs {
    /// Token to sell, as a symbol (e.g. WETH) or 0x address
    pub input_token: String,
    /// Token to buy, as a symbol (e.g. USDC) or 0x address
    pub output_token: String,
    /// Amount to sell in the token's smallest unit (wei for ETH)
    pub amount: String,
    /// Network to quote on: ethereum, arbitrum, optimism or base
    #[serde(default)]
    pub network: Option<String>,
    /// Slippage tolerance in percent
    #[serde(default)]
    pub slippage_percent: Option<f64>,
}
