//! Reasoning backends

use super::types::{ReasonerRequest, ReasonerResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Instant;
use url::Url;

/// Remote service that reads the conversation and decides what to do with it
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn resolve(&self, request: &ReasonerRequest) -> Result<ReasonerResponse>;
}

/// Reasoner reached over HTTP with an optional bearer key
pub struct HttpReasoner {
    client: Client,
    endpoint: Url,
    api_key: Option<SecretString>,
}

impl HttpReasoner {
    pub fn new(endpoint: Url, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl ReasoningBackend for HttpReasoner {
    async fn resolve(&self, request: &ReasonerRequest) -> Result<ReasonerResponse> {
        let started = Instant::now();
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Reasoner request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "Reasoner returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read reasoner response: {}", e)))?;
        let parsed: ReasonerResponse = serde_json::from_str(&body)
            .map_err(|e| Error::malformed_result("reasoner", e.to_string()))?;

        tracing::debug!(
            project = %request.project,
            messages = request.messages.len(),
            tool_results = parsed.tool_results.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Reasoner answered"
        );
        Ok(parsed)
    }
}
