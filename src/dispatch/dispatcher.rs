//! Intent dispatcher
//!
//! One exchange: advertise the catalog to the reasoner, classify its answer and
//! turn it into exactly one `ResultEnvelope`.
//!
//! - no tool results: plain text
//! - a pending tool result: run the named local handler
//! - a resolved tool result: decode it into the matching typed result when the
//!   name is registered, otherwise pass the payload through
//!
//! Only the first tool result of a turn is acted on.

use super::envelope::{RemoteFunctionResult, ResultEnvelope};
use crate::audit::{AuditLog, ExchangeRecord};
use crate::functions::{
    registry, FunctionCall, FunctionRegistry, LocalFunction, LocalFunctionResult, LocalHandlers,
};
use crate::reasoner::{ChatMessage, ReasonerRequest, ReasoningBackend, ToolResolution};
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub struct IntentDispatcher {
    reasoner: Arc<dyn ReasoningBackend>,
    handlers: LocalHandlers,
    registry: &'static FunctionRegistry,
    default_project: String,
    audit: Option<AuditLog>,
}

impl IntentDispatcher {
    pub fn new(reasoner: Arc<dyn ReasoningBackend>, handlers: LocalHandlers) -> Self {
        Self {
            reasoner,
            handlers,
            registry: registry(),
            default_project: "trading".to_string(),
            audit: None,
        }
    }

    /// Routing context used when `resolve` is given an empty one
    pub fn with_default_project(mut self, project: impl Into<String>) -> Self {
        self.default_project = project.into();
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.registry
    }

    /// Resolve one exchange for the conversation so far
    pub async fn resolve(
        &self,
        history: &[ChatMessage],
        routing_context: &str,
    ) -> Result<ResultEnvelope> {
        let exchange_id = Uuid::new_v4();
        let project = if routing_context.trim().is_empty() {
            self.default_project.as_str()
        } else {
            routing_context
        };
        let span = info_span!("exchange", id = %exchange_id, project);
        let started = Instant::now();

        let mut function = None;
        let outcome = self
            .exchange(history, project, &mut function)
            .instrument(span.clone())
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        span.in_scope(|| match &outcome {
            Ok(envelope) => info!(
                kind = envelope.kind(),
                function = envelope.function_name().unwrap_or("-"),
                duration_ms,
                "Exchange resolved"
            ),
            Err(e) => warn!(error = %e, duration_ms, "Exchange failed"),
        });

        if let Some(audit) = &self.audit {
            let record = ExchangeRecord::new(exchange_id, project, duration_ms);
            let record = match &outcome {
                Ok(envelope) => record.succeeded(
                    envelope.kind(),
                    envelope.function_name().map(str::to_string),
                    serde_json::to_value(envelope).ok(),
                ),
                Err(e) => record.failed(function, e),
            };
            audit.record(&record).await;
        }

        outcome
    }

    /// `function` is set to the name of the tool result acted on, if any
    async fn exchange(
        &self,
        history: &[ChatMessage],
        project: &str,
        function: &mut Option<String>,
    ) -> Result<ResultEnvelope> {
        let request = ReasonerRequest {
            messages: history.to_vec(),
            project: project.to_string(),
            functions: self.registry.list(),
        };
        let response = self.reasoner.resolve(&request).await?;

        let first = response
            .first_tool_result()
            .map_err(|e| Error::malformed_result("reasoner", e.to_string()))?;
        let Some(first) = first else {
            return Ok(ResultEnvelope::PlainText(response.content.unwrap_or_default()));
        };
        *function = Some(first.name().to_string());

        let ignored = response.ignored_tool_names();
        if !ignored.is_empty() {
            debug!(acted_on = first.name(), ?ignored, "Ignoring extra tool results");
        }

        match first {
            ToolResolution::Pending(call) => {
                let result = self.call(&call).await?;
                Ok(ResultEnvelope::LocalFunction(result))
            }
            ToolResolution::Resolved { name, value } => normalize(name, value),
        }
    }

    /// Validate and run one local function call
    pub async fn call(&self, call: &FunctionCall) -> Result<LocalFunctionResult> {
        let parsed = self.registry.parse(call)?;
        debug!(function = parsed.function.name(), "Dispatching to local handler");
        self.handlers.invoke(parsed).await
    }
}

/// Decode an already-resolved result by function name
pub fn normalize(name: String, value: Value) -> Result<ResultEnvelope> {
    match LocalFunction::from_name(&name) {
        Some(function) => {
            LocalFunctionResult::decode(function, value).map(ResultEnvelope::LocalFunction)
        }
        None => Ok(ResultEnvelope::RemoteFunction(RemoteFunctionResult {
            name,
            payload: value,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{DataQueryService, Metric, QueryBackend, TraderOverview};
    use crate::cache::TokenCache;
    use crate::config::DexConfig;
    use crate::dex::SwapQuoter;
    use crate::testing::{StubBackend, StubQuoter, StubReasoner};
    use serde_json::json;
    use tempfile::NamedTempFile;
    use tokio_test::{assert_err, assert_ok};

    struct Harness {
        backend: Arc<StubBackend>,
        reasoner: Arc<StubReasoner>,
        dispatcher: IntentDispatcher,
    }

    fn harness(reasoner: StubReasoner) -> Harness {
        let backend = Arc::new(StubBackend::trader_scenario());
        let reasoner = Arc::new(reasoner);
        let data = DataQueryService::new(
            Arc::clone(&backend) as Arc<dyn QueryBackend>,
            Arc::new(TokenCache::new()),
            "user1",
        );
        let handlers = LocalHandlers::new(
            Arc::new(data),
            Arc::new(StubQuoter::new()) as Arc<dyn SwapQuoter>,
            DexConfig::default(),
        );
        let dispatcher = IntentDispatcher::new(
            Arc::clone(&reasoner) as Arc<dyn ReasoningBackend>,
            handlers,
        );
        Harness {
            backend,
            reasoner,
            dispatcher,
        }
    }

    fn history() -> Vec<ChatMessage> {
        vec![ChatMessage::user("How is 0xabc doing?")]
    }

    #[tokio::test]
    async fn test_no_tool_results_is_plain_text() {
        let h = harness(StubReasoner::replying(json!({"content": "Hello"})));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(envelope, ResultEnvelope::PlainText("Hello".to_string()));
        assert!(h.backend.executed().is_empty());
    }

    #[tokio::test]
    async fn test_empty_turn_is_empty_plain_text() {
        let h = harness(StubReasoner::replying(json!({})));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(envelope, ResultEnvelope::PlainText(String::new()));
    }

    #[tokio::test]
    async fn test_request_advertises_catalog_and_history() {
        let h = harness(StubReasoner::replying(json!({"content": "ok"})));
        assert_ok!(h.dispatcher.resolve(&history(), "").await);

        let requests = h.reasoner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].project, "trading");
        assert_eq!(requests[0].messages, history());
        assert_eq!(requests[0].functions, registry().list());
    }

    #[tokio::test]
    async fn test_pending_call_runs_handler_once() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{
                "name": "get_trader_overview",
                "arguments": "{\"address\": \"0xabc\", \"duration\": 7, \"timezone\": \"UTC\"}"
            }]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);

        assert_eq!(
            envelope,
            ResultEnvelope::LocalFunction(LocalFunctionResult::TraderOverview(Some(
                TraderOverview {
                    total_net_profit: 100.0,
                    traded_token_count: 10,
                    win_rate: None,
                    total_volume: None,
                }
            )))
        );
        assert_eq!(h.backend.executions_of(Metric::TraderOverview), 1);
    }

    #[tokio::test]
    async fn test_pending_detail_call_aggregates() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "get_trader_detail", "arguments": {"address": "ADDR1"}}]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        match envelope {
            ResultEnvelope::LocalFunction(LocalFunctionResult::TraderDetail(detail)) => {
                assert_eq!(detail.address, "ADDR1");
                assert_eq!(detail.profit_distribution.len(), 1);
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_required_field_never_reaches_handler() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "get_trader_detail", "arguments": "{\"duration\": 7}"}]
        })));
        let err = assert_err!(h.dispatcher.resolve(&history(), "trading").await);
        assert!(matches!(err, Error::MalformedArguments { .. }));
        assert!(h.backend.executed().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_pending_function() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "get_weather", "arguments": "{}"}]
        })));
        let err = assert_err!(h.dispatcher.resolve(&history(), "trading").await);
        assert!(matches!(err, Error::UnknownFunction(name) if name == "get_weather"));
    }

    #[tokio::test]
    async fn test_unknown_resolved_function_passes_payload_through() {
        let payload = json!({"temp": 21, "nested": {"unit": "C", "list": [1, 2]}});
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "get_weather", "resolved": true, "result": payload}]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(
            envelope,
            ResultEnvelope::RemoteFunction(RemoteFunctionResult {
                name: "get_weather".to_string(),
                payload,
            })
        );
    }

    #[tokio::test]
    async fn test_known_resolved_function_is_normalized() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{
                "name": "get_trader_profit",
                "resolved": true,
                "result": [{"date": "2024-09-15", "netProfit": 12.5}]
            }]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert!(matches!(
            envelope,
            ResultEnvelope::LocalFunction(LocalFunctionResult::TraderProfit(ref points))
                if points.len() == 1
        ));
        assert!(h.backend.executed().is_empty());
    }

    #[tokio::test]
    async fn test_known_resolved_function_with_bad_shape() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "get_trader_profit", "resolved": true, "result": {"no": "list"}}]
        })));
        let err = assert_err!(h.dispatcher.resolve(&history(), "trading").await);
        assert!(matches!(err, Error::MalformedResult { .. }));
    }

    #[tokio::test]
    async fn test_only_first_tool_result_is_used() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [
                {"name": "get_trader_trade_times", "arguments": "{\"address\": \"0xabc\"}"},
                {"name": "get_trader_overview", "arguments": "{\"address\": \"0xabc\"}"},
                {"name": "get_weather", "resolved": true, "result": {"temp": 21}}
            ]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(envelope.function_name(), Some("get_trader_trade_times"));
        assert_eq!(h.backend.executed(), vec![Metric::TradeTimes]);
    }

    #[tokio::test]
    async fn test_malformed_trailing_tool_result_is_ignored() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [
                {"name": "get_trader_overview", "arguments": "{\"address\": \"0xabc\"}"},
                {"name": "", "resolved": false}
            ]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(envelope.function_name(), Some("get_trader_overview"));
        assert_eq!(h.backend.executions_of(Metric::TraderOverview), 1);
    }

    #[tokio::test]
    async fn test_malformed_first_tool_result() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "", "resolved": false}]
        })));
        let err = assert_err!(h.dispatcher.resolve(&history(), "trading").await);
        assert!(matches!(err, Error::MalformedResult { function, .. } if function == "reasoner"));
        assert!(h.backend.executed().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_null_payload_passes_through() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "remote_lookup", "resolved": true, "result": null}]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(
            envelope,
            ResultEnvelope::RemoteFunction(RemoteFunctionResult {
                name: "remote_lookup".to_string(),
                payload: Value::Null,
            })
        );
        assert!(h.backend.executed().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_without_result_key_runs_locally() {
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{
                "name": "get_trader_overview",
                "resolved": true,
                "arguments": "{\"address\": \"0xabc\"}"
            }]
        })));
        let envelope = assert_ok!(h.dispatcher.resolve(&history(), "trading").await);
        assert_eq!(envelope.function_name(), Some("get_trader_overview"));
        assert_eq!(h.backend.executions_of(Metric::TraderOverview), 1);
    }

    #[tokio::test]
    async fn test_reasoner_failure_propagates() {
        let h = harness(StubReasoner::failing("connection refused"));
        let err = assert_err!(h.dispatcher.resolve(&history(), "trading").await);
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_handler_failure_propagates() {
        let backend = Arc::new(
            StubBackend::trader_scenario().with_failure(Metric::TraderProfit, "boom"),
        );
        let data = DataQueryService::new(
            Arc::clone(&backend) as Arc<dyn QueryBackend>,
            Arc::new(TokenCache::new()),
            "user1",
        );
        let handlers = LocalHandlers::new(
            Arc::new(data),
            Arc::new(StubQuoter::new()) as Arc<dyn SwapQuoter>,
            DexConfig::default(),
        );
        let reasoner = StubReasoner::replying(json!({
            "tool_results": [{"name": "get_trader_detail", "arguments": "{\"address\": \"0xabc\"}"}]
        }));
        let dispatcher = IntentDispatcher::new(Arc::new(reasoner), handlers);

        let err = assert_err!(dispatcher.resolve(&history(), "trading").await);
        assert!(matches!(err, Error::Transport(message) if message == "boom"));
        // Every branch still ran
        assert_eq!(backend.executed().len(), 4);
    }

    #[tokio::test]
    async fn test_exchanges_are_audited() {
        let temp_file = NamedTempFile::new().unwrap();
        let h = harness(StubReasoner::replying(json!({"content": "Hello"})));
        let dispatcher = h.dispatcher.with_audit(AuditLog::new(temp_file.path()));

        assert_ok!(dispatcher.resolve(&history(), "research").await);

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["kind"], "plain_text");
        assert_eq!(record["routing_context"], "research");
        assert_eq!(record["status"], "success");
    }

    #[tokio::test]
    async fn test_failed_exchange_audit_names_function() {
        let temp_file = NamedTempFile::new().unwrap();
        let h = harness(StubReasoner::replying(json!({
            "tool_results": [{"name": "get_weather", "arguments": "{}"}]
        })));
        let dispatcher = h.dispatcher.with_audit(AuditLog::new(temp_file.path()));

        assert_err!(dispatcher.resolve(&history(), "trading").await);

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let record: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record["status"], "error");
        assert_eq!(record["function"], "get_weather");
    }

    #[test]
    fn test_normalize_unknown_keeps_payload() {
        let envelope = normalize("get_weather".to_string(), json!(null)).unwrap();
        assert_eq!(
            envelope,
            ResultEnvelope::RemoteFunction(RemoteFunctionResult {
                name: "get_weather".to_string(),
                payload: Value::Null,
            })
        );
    }
}
