//! Typed rows returned by the analytics queries
//!
//! Field names follow the column aliases of the query templates (camelCase).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderOverview {
    pub total_net_profit: f64,
    pub traded_token_count: u32,
    /// Share of profitable token positions (percent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
}

/// Realized profit for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitPoint {
    pub date: String,
    pub net_profit: f64,
}

/// Number of token positions whose ROI falls in `bucket`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitBucket {
    pub bucket: String,
    pub count: u32,
}

/// Number of trades placed in a half-hour slot of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTimeBucket {
    pub range: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartTrader {
    pub address: String,
    pub win_rate: f64,
    pub net_profit: f64,
    pub trade_count: u32,
}

/// Everything known about one trader, fetched as four independent queries
///
/// Only ever constructed after all four branches succeeded, with an overview
/// present and a non-empty profit distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedTraderDetail {
    pub address: String,
    pub overview: TraderOverview,
    pub profit: Vec<ProfitPoint>,
    pub profit_distribution: Vec<ProfitBucket>,
    pub trades: Vec<TradeTimeBucket>,
}
