//! Catalog of the functions this agent can execute locally

use super::args::{SmartMoneyArgs, SwapQuoteArgs, TraderArgs};
use super::spec::FunctionSpec;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// A function implemented by a local handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalFunction {
    TraderOverview,
    TraderProfit,
    TraderProfitDistribution,
    TraderTradeTimes,
    TraderDetail,
    SmartMoney,
    SwapQuote,
}

impl LocalFunction {
    /// Registration order, which is also the order advertised to the reasoner
    pub const ALL: [LocalFunction; 7] = [
        LocalFunction::TraderOverview,
        LocalFunction::TraderProfit,
        LocalFunction::TraderProfitDistribution,
        LocalFunction::TraderTradeTimes,
        LocalFunction::TraderDetail,
        LocalFunction::SmartMoney,
        LocalFunction::SwapQuote,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LocalFunction::TraderOverview => "get_trader_overview",
            LocalFunction::TraderProfit => "get_trader_profit",
            LocalFunction::TraderProfitDistribution => "get_trader_profit_distribution",
            LocalFunction::TraderTradeTimes => "get_trader_trade_times",
            LocalFunction::TraderDetail => "get_trader_detail",
            LocalFunction::SmartMoney => "get_smart_money",
            LocalFunction::SwapQuote => "get_swap_quote",
        }
    }

    pub fn from_name(name: &str) -> Option<LocalFunction> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            LocalFunction::TraderOverview => {
                "Get a trader's total net profit, number of traded tokens and win rate"
            }
            LocalFunction::TraderProfit => "Get a trader's daily realized profit series",
            LocalFunction::TraderProfitDistribution => {
                "Get how a trader's token positions are distributed across ROI buckets"
            }
            LocalFunction::TraderTradeTimes => {
                "Get how many trades a trader placed in each half-hour slot of the day"
            }
            LocalFunction::TraderDetail => {
                "Get a trader's overview, profit series, profit distribution and trade times in one call"
            }
            LocalFunction::SmartMoney => {
                "List the most profitable traders whose win rate reaches a threshold"
            }
            LocalFunction::SwapQuote => "Get a read-only swap quote from the Odos DEX aggregator",
        }
    }

    pub fn spec(&self) -> FunctionSpec {
        let (name, description) = (self.name(), self.description());
        match self {
            LocalFunction::SmartMoney => FunctionSpec::from_args::<SmartMoneyArgs>(name, description),
            LocalFunction::SwapQuote => FunctionSpec::from_args::<SwapQuoteArgs>(name, description),
            _ => FunctionSpec::from_args::<TraderArgs>(name, description),
        }
    }
}

impl fmt::Display for LocalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function the reasoner asked for, with its arguments still JSON-encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A call that named a registered function and passed its parameter checks
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCall {
    pub function: LocalFunction,
    pub arguments: Value,
}

pub struct FunctionRegistry {
    specs: Vec<(LocalFunction, FunctionSpec)>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            specs: LocalFunction::ALL.iter().map(|f| (*f, f.spec())).collect(),
        }
    }

    /// Every spec, in registration order
    pub fn list(&self) -> Vec<FunctionSpec> {
        self.specs.iter().map(|(_, spec)| spec.clone()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|(f, _)| f.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|(f, _)| f.name() == name)
    }

    pub fn resolve(&self, name: &str) -> Result<(LocalFunction, &FunctionSpec)> {
        self.specs
            .iter()
            .find(|(f, _)| f.name() == name)
            .map(|(f, spec)| (*f, spec))
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))
    }

    /// Decode and validate a call's arguments against its spec.
    /// Blank arguments are read as an empty object.
    pub fn parse(&self, call: &FunctionCall) -> Result<ParsedCall> {
        let (function, spec) = self.resolve(&call.name)?;

        let raw = call.arguments.trim();
        let arguments: Value = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw).map_err(|e| {
                Error::malformed_arguments(&call.name, format!("arguments are not valid JSON: {}", e))
            })?
        };

        spec.validate(&arguments)?;
        Ok(ParsedCall {
            function,
            arguments,
        })
    }

    /// Digest of the advertised catalog, logged so deployments can tell
    /// which function set a reasoner was given
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (_, spec) in &self.specs {
            // Specs serialize without fallible fields
            if let Ok(bytes) = serde_json::to_vec(spec) {
                hasher.update(&bytes);
            }
            hasher.update(b"\n");
        }
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..16].to_string()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Get the global function registry
pub fn registry() -> &'static FunctionRegistry {
    REGISTRY.get_or_init(FunctionRegistry::new)
}
