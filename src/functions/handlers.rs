//! Local handlers for the registered functions

use super::args::{SmartMoneyArgs, SwapQuoteArgs, TraderArgs};
use super::registry::{LocalFunction, ParsedCall};
use super::result::LocalFunctionResult;
use crate::analytics::{DataQueryService, QueryRequest};
use crate::config::{DexConfig, Network};
use crate::dex::{registry as tokens, SwapQuoteRequest, SwapQuoter};
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Executes validated calls against the analytics service and the DEX quoter
pub struct LocalHandlers {
    data: Arc<DataQueryService>,
    quoter: Arc<dyn SwapQuoter>,
    dex: DexConfig,
    synthetic: bool,
}

impl LocalHandlers {
    pub fn new(data: Arc<DataQueryService>, quoter: Arc<dyn SwapQuoter>, dex: DexConfig) -> Self {
        Self {
            data,
            quoter,
            dex,
            synthetic: false,
        }
    }

    /// Flag every analytics request as synthetic
    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub async fn invoke(&self, call: ParsedCall) -> Result<LocalFunctionResult> {
        let function = call.function;
        debug!(function = function.name(), "Invoking local handler");

        match function {
            LocalFunction::SmartMoney => {
                let args: SmartMoneyArgs = typed(function, call.arguments)?;
                let request =
                    QueryRequest::from_caller(function.name(), args.duration, args.timezone.as_deref(), "")?
                        .with_rate_threshold(args.rate)
                        .with_synthetic(self.synthetic);
                Ok(LocalFunctionResult::SmartMoney(
                    self.data.smart_money(&request).await?,
                ))
            }
            LocalFunction::SwapQuote => {
                let args: SwapQuoteArgs = typed(function, call.arguments)?;
                let request = self.quote_request(&args)?;
                Ok(LocalFunctionResult::SwapQuote(
                    self.quoter.quote(&request).await?,
                ))
            }
            _ => {
                let args: TraderArgs = typed(function, call.arguments)?;
                let request = QueryRequest::from_caller(
                    function.name(),
                    args.duration,
                    args.timezone.as_deref(),
                    args.address,
                )?
                .with_synthetic(self.synthetic);
                self.trader_metric(function, &request).await
            }
        }
    }

    async fn trader_metric(
        &self,
        function: LocalFunction,
        request: &QueryRequest,
    ) -> Result<LocalFunctionResult> {
        Ok(match function {
            LocalFunction::TraderOverview => {
                LocalFunctionResult::TraderOverview(self.data.trader_overview(request).await?)
            }
            LocalFunction::TraderProfit => {
                LocalFunctionResult::TraderProfit(self.data.trader_profit(request).await?)
            }
            LocalFunction::TraderProfitDistribution => {
                LocalFunctionResult::ProfitDistribution(self.data.profit_distribution(request).await?)
            }
            LocalFunction::TraderTradeTimes => {
                LocalFunctionResult::TradeTimes(self.data.trade_times(request).await?)
            }
            LocalFunction::TraderDetail => {
                LocalFunctionResult::TraderDetail(self.data.trader_detail(request).await?)
            }
            LocalFunction::SmartMoney | LocalFunction::SwapQuote => {
                return Err(Error::UnknownFunction(function.name().to_string()))
            }
        })
    }

    fn quote_request(&self, args: &SwapQuoteArgs) -> Result<SwapQuoteRequest> {
        let function = LocalFunction::SwapQuote.name();

        let network = match args.network.as_deref() {
            Some(name) if !name.trim().is_empty() => Network::parse(name).ok_or_else(|| {
                Error::malformed_arguments(
                    function,
                    format!("field 'network': unsupported network '{}'", name),
                )
            })?,
            _ => self.dex.default_network,
        };

        let resolve = |field: &str, token: &str| -> Result<Address> {
            tokens().resolve(network.chain_id(), token).ok_or_else(|| {
                Error::malformed_arguments(
                    function,
                    format!(
                        "field '{}': unknown token '{}' on {}",
                        field,
                        token,
                        network.name()
                    ),
                )
            })
        };
        let input_token = resolve("input_token", &args.input_token)?;
        let output_token = resolve("output_token", &args.output_token)?;
        if input_token == output_token {
            return Err(Error::malformed_arguments(
                function,
                "input_token and output_token must differ",
            ));
        }

        let amount = U256::from_str(args.amount.trim()).map_err(|e| {
            Error::malformed_arguments(function, format!("field 'amount': {}", e))
        })?;
        if amount.is_zero() {
            return Err(Error::malformed_arguments(
                function,
                "field 'amount': must be greater than zero",
            ));
        }

        let slippage_percent = args
            .slippage_percent
            .unwrap_or(self.dex.default_slippage_percent);
        if !(0.0..=50.0).contains(&slippage_percent) {
            return Err(Error::malformed_arguments(
                function,
                format!(
                    "field 'slippage_percent': {} is outside 0..=50",
                    slippage_percent
                ),
            ));
        }

        Ok(SwapQuoteRequest {
            network,
            input_token,
            output_token,
            amount,
            slippage_percent,
        })
    }
}

fn typed<T: DeserializeOwned>(function: LocalFunction, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| Error::malformed_arguments(function.name(), e.to_string()))
}
