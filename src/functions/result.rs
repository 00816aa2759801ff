//! Typed outputs of the local functions

use super::registry::LocalFunction;
use crate::analytics::{
    AggregatedTraderDetail, ProfitBucket, ProfitPoint, SmartTrader, TradeTimeBucket,
    TraderOverview,
};
use crate::dex::SwapQuote;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Output of one local function, tagged with the function's registered name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "function", content = "data")]
pub enum LocalFunctionResult {
    /// `None` when the trader has no trades in the window
    #[serde(rename = "get_trader_overview")]
    TraderOverview(Option<TraderOverview>),
    #[serde(rename = "get_trader_profit")]
    TraderProfit(Vec<ProfitPoint>),
    #[serde(rename = "get_trader_profit_distribution")]
    ProfitDistribution(Vec<ProfitBucket>),
    #[serde(rename = "get_trader_trade_times")]
    TradeTimes(Vec<TradeTimeBucket>),
    #[serde(rename = "get_trader_detail")]
    TraderDetail(AggregatedTraderDetail),
    #[serde(rename = "get_smart_money")]
    SmartMoney(Vec<SmartTrader>),
    #[serde(rename = "get_swap_quote")]
    SwapQuote(SwapQuote),
}

impl LocalFunctionResult {
    pub fn function(&self) -> LocalFunction {
        match self {
            LocalFunctionResult::TraderOverview(_) => LocalFunction::TraderOverview,
            LocalFunctionResult::TraderProfit(_) => LocalFunction::TraderProfit,
            LocalFunctionResult::ProfitDistribution(_) => LocalFunction::TraderProfitDistribution,
            LocalFunctionResult::TradeTimes(_) => LocalFunction::TraderTradeTimes,
            LocalFunctionResult::TraderDetail(_) => LocalFunction::TraderDetail,
            LocalFunctionResult::SmartMoney(_) => LocalFunction::SmartMoney,
            LocalFunctionResult::SwapQuote(_) => LocalFunction::SwapQuote,
        }
    }

    /// Decode a payload produced elsewhere for a registered function
    pub fn decode(function: LocalFunction, payload: Value) -> Result<Self> {
        Ok(match function {
            LocalFunction::TraderOverview => Self::TraderOverview(typed(function, payload)?),
            LocalFunction::TraderProfit => Self::TraderProfit(typed(function, payload)?),
            LocalFunction::TraderProfitDistribution => {
                Self::ProfitDistribution(typed(function, payload)?)
            }
            LocalFunction::TraderTradeTimes => Self::TradeTimes(typed(function, payload)?),
            LocalFunction::TraderDetail => Self::TraderDetail(typed(function, payload)?),
            LocalFunction::SmartMoney => Self::SmartMoney(typed(function, payload)?),
            LocalFunction::SwapQuote => Self::SwapQuote(typed(function, payload)?),
        })
    }
}

fn typed<T: DeserializeOwned>(function: LocalFunction, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| Error::malformed_result(function.name(), e.to_string()))
}
