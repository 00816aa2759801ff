//! Deterministic synthetic data
//!
//! Serves fixed rows for every metric so demos and offline sessions exercise
//! the same decode and aggregation paths as live queries. Values depend only
//! on the bound query, never on time or randomness.

use super::backend::{QueryBackend, Row};
use super::query::{BoundQuery, Metric};
use crate::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{json, Value};

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticBackend;

impl SyntheticBackend {
    pub fn new() -> Self {
        Self
    }

    fn rows(query: &BoundQuery) -> Vec<Value> {
        let days = query
            .parameter("days")
            .and_then(Value::as_u64)
            .unwrap_or(7);

        match query.metric {
            Metric::TraderOverview => vec![json!({
                "totalNetProfit": 1520.4,
                "tradedTokenCount": 12,
                "winRate": 58.3,
                "totalVolume": 48210.0
            })],
            Metric::TraderProfit => (0..days.min(31))
                .map(|day| {
                    json!({
                        "date": format!("2024-09-{:02}", day + 1),
                        "netProfit": (day as f64 * 37.0) % 211.0 - 90.0
                    })
                })
                .collect(),
            Metric::ProfitDistribution => [
                ("< -100%", 1),
                ("[-100%, -50%)", 2),
                ("[-50%, 0%)", 3),
                ("[0%, 50%)", 4),
                ("[50%, 100%)", 1),
                ("[100%, 500%)", 1),
            ]
            .iter()
            .map(|(bucket, count)| json!({ "bucket": bucket, "count": count }))
            .collect(),
            Metric::TradeTimes => (0..48u32)
                .filter(|slot| slot % 6 == 1)
                .map(|slot| {
                    let start = slot * 30;
                    let end = start + 30;
                    json!({
                        "range": format!(
                            "[{:02}:{:02}-{:02}:{:02})",
                            start / 60,
                            start % 60,
                            end / 60,
                            end % 60
                        ),
                        "count": slot % 5 + 1
                    })
                })
                .collect(),
            Metric::SmartMoney => {
                let rate = query
                    .parameter("rate")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                [
                    ("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984", 81.5, 92_340.0, 140),
                    ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", 74.0, 41_200.5, 88),
                    ("0xe592427a0aece92de3edee1f18e0157c05861564", 63.2, 12_004.0, 310),
                ]
                .iter()
                .filter(|(_, win_rate, _, _)| *win_rate >= rate)
                .map(|(address, win_rate, net_profit, trade_count)| {
                    json!({
                        "address": address,
                        "winRate": win_rate,
                        "netProfit": net_profit,
                        "tradeCount": trade_count
                    })
                })
                .collect()
            }
        }
    }
}

#[async_trait]
impl QueryBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn authenticate(&self, _principal: &str) -> Result<SecretString> {
        Ok(SecretString::from("synthetic-session".to_string()))
    }

    async fn execute(&self, _token: &SecretString, query: &BoundQuery) -> Result<Vec<Row>> {
        Ok(Self::rows(query)
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::query::QueryRequest;

    #[tokio::test]
    async fn test_profit_rows_follow_duration() {
        let backend = SyntheticBackend::new();
        let token = backend.authenticate("demo").await.unwrap();
        let query = QueryRequest::new("0xabc")
            .with_duration(10)
            .bind(Metric::TraderProfit)
            .unwrap();

        let rows = backend.execute(&token, &query).await.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0]["date"], json!("2024-09-01"));
    }

    #[tokio::test]
    async fn test_smart_money_respects_rate() {
        let backend = SyntheticBackend::new();
        let token = backend.authenticate("demo").await.unwrap();
        let query = QueryRequest::new("")
            .with_rate_threshold(Some(70.0))
            .bind(Metric::SmartMoney)
            .unwrap();

        let rows = backend.execute(&token, &query).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_trade_time_ranges_are_half_hours() {
        let backend = SyntheticBackend::new();
        let token = backend.authenticate("demo").await.unwrap();
        let query = QueryRequest::new("0xabc").bind(Metric::TradeTimes).unwrap();

        let rows = backend.execute(&token, &query).await.unwrap();
        assert_eq!(rows[0]["range"], json!("[00:30-01:00)"));
    }
}
