//! Data query service
//!
//! Named analytics operations. Each one obtains a cached or fresh session
//! token, binds its metric's template, executes it and decodes the rows.
//! `trader_detail` composes four of them concurrently.

use super::backend::{QueryBackend, Row};
use super::models::{
    AggregatedTraderDetail, ProfitBucket, ProfitPoint, SmartTrader, TradeTimeBucket,
    TraderOverview,
};
use super::query::{Metric, QueryRequest};
use super::synthetic::SyntheticBackend;
use crate::cache::{Credential, TokenCache};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct DataQueryService {
    live: Arc<dyn QueryBackend>,
    synthetic: Arc<dyn QueryBackend>,
    cache: Arc<TokenCache>,
    principal: String,
    synthetic_only: bool,
}

impl DataQueryService {
    /// Create a service querying `live`, caching sessions for `principal` in `cache`
    pub fn new(
        live: Arc<dyn QueryBackend>,
        cache: Arc<TokenCache>,
        principal: impl Into<String>,
    ) -> Self {
        Self {
            live,
            synthetic: Arc::new(SyntheticBackend::new()),
            cache,
            principal: principal.into(),
            synthetic_only: false,
        }
    }

    /// A service that never leaves the process
    pub fn synthetic() -> Self {
        Self::new(
            Arc::new(SyntheticBackend::new()),
            Arc::new(TokenCache::new()),
            "synthetic",
        )
        .with_synthetic_only(true)
    }

    /// Route every request to the synthetic backend, whatever its flag
    pub fn with_synthetic_only(mut self, synthetic_only: bool) -> Self {
        self.synthetic_only = synthetic_only;
        self
    }

    fn backend_for(&self, request: &QueryRequest) -> &dyn QueryBackend {
        if self.synthetic_only || request.is_synthetic() {
            self.synthetic.as_ref()
        } else {
            self.live.as_ref()
        }
    }

    async fn credential(&self, backend: &dyn QueryBackend) -> Result<Credential> {
        if let Some(credential) = self.cache.get(backend.name(), &self.principal).await {
            return Ok(credential);
        }
        debug!(backend = backend.name(), principal = %self.principal, "No cached session");
        self.refresh(backend).await
    }

    /// Authenticate and overwrite whatever is cached for the principal
    async fn refresh(&self, backend: &dyn QueryBackend) -> Result<Credential> {
        let token = backend.authenticate(&self.principal).await?;
        Ok(self.cache.put(backend.name(), &self.principal, token).await)
    }

    /// Run one metric, re-authenticating once if the cached session was rejected
    pub async fn rows(&self, metric: Metric, request: &QueryRequest) -> Result<Vec<Row>> {
        let backend = self.backend_for(request);
        let query = request.bind(metric)?;
        let credential = self.credential(backend).await?;
        let started = Instant::now();

        let result = match backend.execute(credential.secret(), &query).await {
            Err(Error::AuthExpired(_)) => {
                warn!(
                    metric = metric.name(),
                    backend = backend.name(),
                    session_age_secs = credential.age().num_seconds(),
                    "Session rejected, re-authenticating"
                );
                let credential = self.refresh(backend).await?;
                backend.execute(credential.secret(), &query).await
            }
            other => other,
        };

        debug!(
            metric = metric.name(),
            backend = backend.name(),
            latency_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Analytics query finished"
        );
        result
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        metric: Metric,
        request: &QueryRequest,
    ) -> Result<Vec<T>> {
        self.rows(metric, request)
            .await?
            .into_iter()
            .map(|row| {
                serde_json::from_value(Value::Object(row))
                    .map_err(|e| Error::malformed_result(metric.name(), e.to_string()))
            })
            .collect()
    }

    /// Totals for the trader, or `None` when the window holds no trades
    pub async fn trader_overview(&self, request: &QueryRequest) -> Result<Option<TraderOverview>> {
        let rows = self.fetch(Metric::TraderOverview, request).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn trader_profit(&self, request: &QueryRequest) -> Result<Vec<ProfitPoint>> {
        self.fetch(Metric::TraderProfit, request).await
    }

    pub async fn profit_distribution(&self, request: &QueryRequest) -> Result<Vec<ProfitBucket>> {
        self.fetch(Metric::ProfitDistribution, request).await
    }

    pub async fn trade_times(&self, request: &QueryRequest) -> Result<Vec<TradeTimeBucket>> {
        self.fetch(Metric::TradeTimes, request).await
    }

    /// Traders whose win rate reaches the request's rate threshold
    pub async fn smart_money(&self, request: &QueryRequest) -> Result<Vec<SmartTrader>> {
        self.fetch(Metric::SmartMoney, request).await
    }

    /// Fetch overview, profit series, profit distribution and trade times concurrently
    ///
    /// Every branch runs to completion. When several fail, the error reported is
    /// the first in the order overview, profit, distribution, trades, whatever
    /// order they actually finished in. Partial results are dropped.
    pub async fn trader_detail(&self, request: &QueryRequest) -> Result<AggregatedTraderDetail> {
        let started = Instant::now();

        let (overview, profit, distribution, trades) = futures::join!(
            self.trader_overview(request),
            self.trader_profit(request),
            self.profit_distribution(request),
            self.trade_times(request)
        );

        let outcome = assemble(request.address(), overview, profit, distribution, trades);
        match &outcome {
            Ok(detail) => info!(
                address = %detail.address,
                profit_points = detail.profit.len(),
                buckets = detail.profit_distribution.len(),
                trade_slots = detail.trades.len(),
                latency_ms = started.elapsed().as_millis() as u64,
                "Trader detail aggregated"
            ),
            Err(e) => warn!(address = %request.address(), error = %e, "Trader detail failed"),
        }
        outcome
    }
}

fn assemble(
    address: &str,
    overview: Result<Option<TraderOverview>>,
    profit: Result<Vec<ProfitPoint>>,
    distribution: Result<Vec<ProfitBucket>>,
    trades: Result<Vec<TradeTimeBucket>>,
) -> Result<AggregatedTraderDetail> {
    let overview = overview?;
    let profit = profit?;
    let profit_distribution = distribution?;
    let trades = trades?;

    let overview = overview.ok_or_else(|| Error::incomplete(address, "overview is empty"))?;
    if profit_distribution.is_empty() {
        return Err(Error::incomplete(address, "profit distribution is empty"));
    }

    Ok(AggregatedTraderDetail {
        address: address.to_string(),
        overview,
        profit,
        profit_distribution,
        trades,
    })
}
