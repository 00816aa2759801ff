//! Metrics, query requests and the fixed query templates they bind into

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Duration used when the caller does not give one (days)
pub const DEFAULT_DURATION_DAYS: u32 = 7;

/// Minimum win rate (percent) for the smart-money ranking when none is given
pub const DEFAULT_RATE_THRESHOLD: f64 = 60.0;

/// Timezone used to bucket trades into days and time slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timezone {
    #[serde(rename = "UTC")]
    Utc,
    /// China Standard Time (UTC+8)
    #[serde(rename = "CST")]
    Cst,
}

impl Timezone {
    pub fn label(&self) -> &'static str {
        match self {
            Timezone::Utc => "UTC",
            Timezone::Cst => "CST",
        }
    }

    /// Name understood by the analytics database
    pub fn iana(&self) -> &'static str {
        match self {
            Timezone::Utc => "UTC",
            Timezone::Cst => "Asia/Shanghai",
        }
    }

    /// Parse a caller-supplied label, ignoring case. Empty means "use the metric default".
    pub fn parse_label(label: &str) -> std::result::Result<Option<Timezone>, String> {
        match label.trim().to_uppercase().as_str() {
            "" => Ok(None),
            "UTC" => Ok(Some(Timezone::Utc)),
            "CST" => Ok(Some(Timezone::Cst)),
            other => Err(format!("unsupported timezone '{}', expected UTC or CST", other)),
        }
    }
}

/// A named analytics query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TraderOverview,
    TraderProfit,
    ProfitDistribution,
    TradeTimes,
    SmartMoney,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::TraderOverview,
        Metric::TraderProfit,
        Metric::ProfitDistribution,
        Metric::TradeTimes,
        Metric::SmartMoney,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::TraderOverview => "trader_overview",
            Metric::TraderProfit => "trader_profit",
            Metric::ProfitDistribution => "profit_distribution",
            Metric::TradeTimes => "trade_times",
            Metric::SmartMoney => "smart_money",
        }
    }

    /// Shortest window the metric is meaningful for (days)
    pub fn min_duration_days(&self) -> u32 {
        match self {
            Metric::TraderProfit => 3,
            Metric::SmartMoney => 7,
            Metric::TraderOverview | Metric::ProfitDistribution | Metric::TradeTimes => 1,
        }
    }

    pub fn default_timezone(&self) -> Timezone {
        match self {
            Metric::SmartMoney => Timezone::Cst,
            _ => Timezone::Utc,
        }
    }

    /// Whether the query is scoped to a single trader address
    pub fn per_trader(&self) -> bool {
        !matches!(self, Metric::SmartMoney)
    }

    pub fn template(&self) -> &'static str {
        match self {
            Metric::TraderOverview => templates::TRADER_OVERVIEW,
            Metric::TraderProfit => templates::TRADER_PROFIT,
            Metric::ProfitDistribution => templates::PROFIT_DISTRIBUTION,
            Metric::TradeTimes => templates::TRADE_TIMES,
            Metric::SmartMoney => templates::SMART_MONEY,
        }
    }
}

/// Parameters for one analytics query, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    duration_days: u32,
    timezone: Option<Timezone>,
    address: String,
    rate_threshold: Option<f64>,
    synthetic: bool,
}

impl QueryRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            duration_days: DEFAULT_DURATION_DAYS,
            timezone: None,
            address: address.into().trim().to_string(),
            rate_threshold: None,
            synthetic: false,
        }
    }

    /// Build from raw caller input (`duration`, `"UTC"`/`"CST"`/`""`, `address`).
    /// `operation` names the caller in error messages.
    pub fn from_caller(
        operation: &str,
        duration: Option<u32>,
        timezone: Option<&str>,
        address: impl Into<String>,
    ) -> Result<Self> {
        let timezone = match timezone {
            Some(label) => Timezone::parse_label(label).map_err(|reason| {
                Error::malformed_arguments(operation, format!("field 'timezone': {}", reason))
            })?,
            None => None,
        };
        Ok(Self::new(address)
            .with_duration(duration.unwrap_or(DEFAULT_DURATION_DAYS))
            .with_timezone(timezone))
    }

    pub fn with_duration(mut self, days: u32) -> Self {
        self.duration_days = days;
        self
    }

    pub fn with_timezone(mut self, timezone: Option<Timezone>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_rate_threshold(mut self, rate: Option<f64>) -> Self {
        self.rate_threshold = rate;
        self
    }

    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn timezone(&self) -> Option<Timezone> {
        self.timezone
    }

    pub fn rate_threshold(&self) -> Option<f64> {
        self.rate_threshold
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Requested duration raised to the metric's floor
    pub fn duration_for(&self, metric: Metric) -> u32 {
        self.duration_days.max(metric.min_duration_days())
    }

    pub fn timezone_for(&self, metric: Metric) -> Timezone {
        self.timezone.unwrap_or_else(|| metric.default_timezone())
    }

    /// Bind the metric's template to this request's parameters
    pub fn bind(&self, metric: Metric) -> Result<BoundQuery> {
        if metric.per_trader() && self.address.is_empty() {
            return Err(Error::malformed_arguments(
                metric.name(),
                "address must not be empty",
            ));
        }

        let mut parameters = vec![
            QueryParameter::new("days", json!(self.duration_for(metric))),
            QueryParameter::new("timezone", json!(self.timezone_for(metric).iana())),
        ];
        if metric.per_trader() {
            parameters.push(QueryParameter::new(
                "address",
                json!(self.address.to_lowercase()),
            ));
        } else {
            let rate = self.rate_threshold.unwrap_or(DEFAULT_RATE_THRESHOLD);
            parameters.push(QueryParameter::new("rate", json!(rate)));
        }

        Ok(BoundQuery {
            metric,
            sql: metric.template(),
            parameters,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParameter {
    pub name: &'static str,
    pub value: Value,
}

impl QueryParameter {
    fn new(name: &'static str, value: Value) -> Self {
        Self { name, value }
    }
}

/// A template plus its parameter values, ready to execute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundQuery {
    pub metric: Metric,
    pub sql: &'static str,
    pub parameters: Vec<QueryParameter>,
}

impl BoundQuery {
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Native query templates. Column aliases match the row models' field names.
mod templates {
    pub const TRADER_OVERVIEW: &str = r#"
        SELECT
            SUM(realized_profit_usd)                                      AS "totalNetProfit",
            COUNT(DISTINCT token_address)                                 AS "tradedTokenCount",
            100.0 * AVG(CASE WHEN realized_profit_usd > 0 THEN 1 ELSE 0 END) AS "winRate",
            SUM(volume_usd)                                               AS "totalVolume"
        FROM trader_token_pnl
        WHERE trader = {{address}}
          AND block_time >= now() - ({{days}} || ' days')::interval
        HAVING COUNT(*) > 0
    "#;

    pub const TRADER_PROFIT: &str = r#"
        SELECT
            to_char(date_trunc('day', block_time AT TIME ZONE {{timezone}}), 'YYYY-MM-DD') AS "date",
            SUM(realized_profit_usd)                                                      AS "netProfit"
        FROM trader_token_pnl
        WHERE trader = {{address}}
          AND block_time >= now() - ({{days}} || ' days')::interval
        GROUP BY 1
        ORDER BY 1
    "#;

    pub const PROFIT_DISTRIBUTION: &str = r#"
        SELECT bucket AS "bucket", COUNT(*) AS "count"
        FROM (
            SELECT
                CASE
                    WHEN roi < -1.0 THEN '< -100%'
                    WHEN roi < -0.5 THEN '[-100%, -50%)'
                    WHEN roi < 0    THEN '[-50%, 0%)'
                    WHEN roi < 0.5  THEN '[0%, 50%)'
                    WHEN roi < 1.0  THEN '[50%, 100%)'
                    WHEN roi < 5.0  THEN '[100%, 500%)'
                    ELSE '>= 500%'
                END AS bucket,
                roi
            FROM trader_token_pnl
            WHERE trader = {{address}}
              AND block_time >= now() - ({{days}} || ' days')::interval
        ) buckets
        GROUP BY bucket
        ORDER BY MIN(roi)
    "#;

    pub const TRADE_TIMES: &str = r#"
        SELECT
            '[' || to_char(slot, 'HH24:MI') || '-' || to_char(slot + interval '30 minutes', 'HH24:MI') || ')' AS "range",
            COUNT(*)                                                                                          AS "count"
        FROM (
            SELECT (
                date_trunc('hour', block_time AT TIME ZONE {{timezone}})
                + floor(extract(minute FROM block_time AT TIME ZONE {{timezone}}) / 30) * interval '30 minutes'
            )::time AS slot
            FROM dex_trades
            WHERE trader = {{address}}
              AND block_time >= now() - ({{days}} || ' days')::interval
        ) slots
        GROUP BY slot
        ORDER BY slot
    "#;

    pub const SMART_MONEY: &str = r#"
        SELECT
            trader                                                            AS "address",
            100.0 * AVG(CASE WHEN realized_profit_usd > 0 THEN 1 ELSE 0 END) AS "winRate",
            SUM(realized_profit_usd)                                          AS "netProfit",
            COUNT(*)                                                          AS "tradeCount"
        FROM trader_token_pnl
        WHERE block_time AT TIME ZONE {{timezone}} >= now() AT TIME ZONE {{timezone}} - ({{days}} || ' days')::interval
        GROUP BY trader
        HAVING 100.0 * AVG(CASE WHEN realized_profit_usd > 0 THEN 1 ELSE 0 END) >= {{rate}}
        ORDER BY "netProfit" DESC
        LIMIT 50
    "#;
}
