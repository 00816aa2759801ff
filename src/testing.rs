//! Test doubles shared by the unit tests

use crate::analytics::{BoundQuery, Metric, QueryBackend, Row};
use crate::dex::{SwapQuote, SwapQuoteRequest, SwapQuoter};
use crate::reasoner::{ReasonerRequest, ReasonerResponse, ReasoningBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum StubResponse {
    Rows(Vec<Value>),
    Fail(String),
}

/// Analytics backend answering from a per-metric table
#[derive(Default)]
pub struct StubBackend {
    responses: HashMap<Metric, StubResponse>,
    auth_calls: AtomicUsize,
    expire_next: AtomicUsize,
    executed: Mutex<Vec<Metric>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The trader used throughout the aggregation scenarios
    pub fn trader_scenario() -> Self {
        Self::new()
            .with_rows(
                Metric::TraderOverview,
                vec![json!({"totalNetProfit": 100, "tradedTokenCount": 10})],
            )
            .with_rows(
                Metric::TraderProfit,
                vec![json!({"date": "2024-09-15", "netProfit": -1})],
            )
            .with_rows(
                Metric::ProfitDistribution,
                vec![json!({"bucket": "< -100%", "count": 5})],
            )
            .with_rows(
                Metric::TradeTimes,
                vec![json!({"range": "[00:00-00:30)", "count": 2})],
            )
    }

    pub fn with_rows(mut self, metric: Metric, rows: Vec<Value>) -> Self {
        self.responses.insert(metric, StubResponse::Rows(rows));
        self
    }

    pub fn with_failure(mut self, metric: Metric, message: &str) -> Self {
        self.responses
            .insert(metric, StubResponse::Fail(message.to_string()));
        self
    }

    /// Reject the next `count` executions as if the session had expired
    pub fn expire_tokens(self, count: usize) -> Self {
        self.expire_next.store(count, Ordering::SeqCst);
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<Metric> {
        self.executed.lock().unwrap().clone()
    }

    pub fn executions_of(&self, metric: Metric) -> usize {
        self.executed().iter().filter(|m| **m == metric).count()
    }
}

#[async_trait]
impl QueryBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn authenticate(&self, principal: &str) -> Result<SecretString> {
        let n = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SecretString::from(format!("{principal}-token-{n}")))
    }

    async fn execute(&self, _token: &SecretString, query: &BoundQuery) -> Result<Vec<Row>> {
        // Let sibling branches interleave
        tokio::task::yield_now().await;

        let expired = self
            .expire_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if expired {
            return Err(Error::AuthExpired(self.name().to_string()));
        }

        self.executed.lock().unwrap().push(query.metric);

        match self.responses.get(&query.metric) {
            Some(StubResponse::Rows(rows)) => Ok(rows
                .iter()
                .filter_map(|row| row.as_object().cloned())
                .collect()),
            Some(StubResponse::Fail(message)) => Err(Error::Transport(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Reasoner replaying one canned response and recording what it was sent
pub struct StubReasoner {
    response: std::result::Result<Value, String>,
    requests: Mutex<Vec<ReasonerRequest>>,
}

impl StubReasoner {
    pub fn replying(response: Value) -> Self {
        Self {
            response: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ReasonerRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningBackend for StubReasoner {
    async fn resolve(&self, request: &ReasonerRequest) -> Result<ReasonerResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.response {
            Ok(value) => Ok(serde_json::from_value(value.clone())?),
            Err(message) => Err(Error::Transport(message.clone())),
        }
    }
}

/// Quoter answering every request with the same output amount
#[derive(Default)]
pub struct StubQuoter {
    requests: Mutex<Vec<SwapQuoteRequest>>,
}

impl StubQuoter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<SwapQuoteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapQuoter for StubQuoter {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<SwapQuote> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(SwapQuote {
            network: request.network.name().to_string(),
            input_token: request.input_token.to_string(),
            output_token: request.output_token.to_string(),
            input_symbol: None,
            output_symbol: None,
            input_amount: request.amount.to_string(),
            output_amount: "3500000000".to_string(),
            price_impact_percent: Some(0.01),
            gas_estimate: None,
            path_id: None,
        })
    }
}
