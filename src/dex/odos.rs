//! Swap quotes from the Odos DEX aggregator
//!
//! Read-only: quotes are requested for a configured wallet address but no
//! transaction is ever built or signed here.

use super::tokens::registry;
use crate::config::Network;
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use odos_sdk::{Chain, Slippage};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

/// A validated quote request
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuoteRequest {
    pub network: Network,
    pub input_token: Address,
    pub output_token: Address,
    /// Input amount in the token's smallest unit
    pub amount: U256,
    pub slippage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub network: String,
    pub input_token: String,
    pub output_token: String,
    #[serde(default)]
    pub input_symbol: Option<String>,
    #[serde(default)]
    pub output_symbol: Option<String>,
    pub input_amount: String,
    pub output_amount: String,
    #[serde(default)]
    pub price_impact_percent: Option<f64>,
    #[serde(default)]
    pub gas_estimate: Option<f64>,
    #[serde(default)]
    pub path_id: Option<String>,
}

#[async_trait]
pub trait SwapQuoter: Send + Sync {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<SwapQuote>;
}

pub struct OdosQuoter {
    client: odos_sdk::OdosClient,
    /// Public address the quote is requested for
    wallet_address: Address,
}

impl OdosQuoter {
    pub fn try_new(wallet_address: &str) -> Result<Self> {
        let wallet_address = Address::from_str(wallet_address)
            .map_err(|e| Error::Config(format!("Invalid wallet address: {}", e)))?;
        let client = odos_sdk::OdosClient::new()
            .map_err(|e| Error::Dex(format!("Failed to create Odos client: {}", e)))?;
        Ok(Self {
            client,
            wallet_address,
        })
    }

    fn chain_for(network: Network) -> Chain {
        match network {
            Network::Ethereum => Chain::ethereum(),
            Network::Arbitrum => Chain::arbitrum(),
            Network::Optimism => Chain::optimism(),
            Network::Base => Chain::base(),
        }
    }
}

#[async_trait]
impl SwapQuoter for OdosQuoter {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<SwapQuote> {
        let slippage = Slippage::percent(request.slippage_percent)
            .map_err(|e| Error::Dex(format!("Invalid slippage: {}", e)))?;

        let quote = self
            .client
            .swap()
            .chain(Self::chain_for(request.network))
            .from_token(request.input_token, request.amount)
            .to_token(request.output_token)
            .slippage(slippage)
            .signer(self.wallet_address)
            .quote()
            .await
            .map_err(|e| Error::Dex(format!("Odos quote failed: {}", e)))?;

        let chain_id = request.network.chain_id();
        let tokens = registry();
        let symbol = |address: &Address| tokens.by_address(chain_id, address).map(|t| t.symbol);

        let output_amount = quote
            .out_amount()
            .cloned()
            .unwrap_or_else(|| "0".to_string());

        tracing::info!(
            network = request.network.name(),
            input = %request.input_token,
            output = %request.output_token,
            amount = %request.amount,
            output_amount = %output_amount,
            "Odos quote received"
        );

        let value = json!({
            "network": request.network.name(),
            "inputToken": request.input_token.to_string(),
            "outputToken": request.output_token.to_string(),
            "inputSymbol": symbol(&request.input_token),
            "outputSymbol": symbol(&request.output_token),
            "inputAmount": request.amount.to_string(),
            "outputAmount": output_amount,
            "priceImpactPercent": quote.price_impact(),
            "gasEstimate": quote.gas_estimate(),
            "pathId": quote.path_id(),
        });
        serde_json::from_value(value).map_err(|e| Error::Dex(format!("Unexpected quote shape: {}", e)))
    }
}
