//! Agent runner
//!
//! Wires the dispatcher from configuration and drives an interactive chat
//! session over any line-oriented input and output.

use crate::analytics::{DataQueryService, HttpQueryBackend, QueryBackend};
use crate::audit::AuditLog;
use crate::cache::TokenCache;
use crate::config::{Config, Secrets};
use crate::dex::{OdosQuoter, SwapQuoter};
use crate::dispatch::{IntentDispatcher, ResultEnvelope};
use crate::functions::LocalHandlers;
use crate::reasoner::{ChatMessage, HttpReasoner, ReasoningBackend};
use crate::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Builds the dispatcher and its collaborators from configuration
pub struct AgentRunner {
    config: Config,
    synthetic: bool,
}

impl AgentRunner {
    /// `synthetic` answers every analytics query from in-process data
    pub fn new(config: Config, synthetic: bool) -> Self {
        Self { config, synthetic }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatcher backed by the HTTP reasoner
    pub fn build(&self, mut secrets: Secrets) -> Result<IntentDispatcher> {
        let reasoner = HttpReasoner::new(self.config.reasoner_url()?, secrets.reasoner_api_key.take());
        self.build_with_reasoner(Arc::new(reasoner), secrets)
    }

    pub fn build_with_reasoner(
        &self,
        reasoner: Arc<dyn ReasoningBackend>,
        secrets: Secrets,
    ) -> Result<IntentDispatcher> {
        let analytics = &self.config.analytics;
        let principal = secrets
            .analytics_username
            .clone()
            .unwrap_or_else(|| analytics.username.clone());

        let live = HttpQueryBackend::new(
            self.config.analytics_url()?,
            analytics.database_id,
            secrets.analytics_password,
        );
        let data = DataQueryService::new(
            Arc::new(live) as Arc<dyn QueryBackend>,
            TokenCache::shared(),
            principal.clone(),
        )
        .with_synthetic_only(analytics.synthetic);

        let quoter = OdosQuoter::try_new(&secrets.wallet_address)?;
        let handlers = LocalHandlers::new(
            Arc::new(data),
            Arc::new(quoter) as Arc<dyn SwapQuoter>,
            self.config.dex.clone(),
        )
        .with_synthetic(self.synthetic);

        let mut dispatcher = IntentDispatcher::new(reasoner, handlers)
            .with_default_project(self.config.reasoner.default_project.clone());
        if let Some(path) = &self.config.audit_log_path {
            info!(audit_path = %path, "Audit trail enabled");
            dispatcher = dispatcher.with_audit(AuditLog::new(path));
        }

        info!(
            principal = %principal,
            synthetic = self.synthetic || analytics.synthetic,
            functions = dispatcher.registry().list().len(),
            catalog = %dispatcher.registry().fingerprint(),
            "Dispatcher ready"
        );
        Ok(dispatcher)
    }
}

/// An interactive conversation that keeps its history between turns
pub struct ChatSession<'a> {
    dispatcher: &'a IntentDispatcher,
    routing_context: String,
    history: Vec<ChatMessage>,
}

impl<'a> ChatSession<'a> {
    pub fn new(dispatcher: &'a IntentDispatcher, routing_context: impl Into<String>) -> Self {
        Self {
            dispatcher,
            routing_context: routing_context.into(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// One user turn. A failed turn is dropped from the history.
    pub async fn turn(&mut self, input: &str) -> Result<ResultEnvelope> {
        self.history.push(ChatMessage::user(input));
        match self
            .dispatcher
            .resolve(&self.history, &self.routing_context)
            .await
        {
            Ok(envelope) => {
                self.history.push(ChatMessage::assistant(envelope.render()));
                Ok(envelope)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    /// Read lines until end of input or `exit`/`quit`. Failed turns are printed
    /// and the session continues.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            write(&mut output, "> ").await?;
            let Some(line) = lines.next_line().await.map_err(io_error)? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                break;
            }

            let reply = match self.turn(line).await {
                Ok(envelope) => envelope.render(),
                Err(e) => {
                    warn!(error = %e, "Turn failed");
                    format!("Error: {}", e)
                }
            };
            write(&mut output, &format!("{}\n", reply)).await?;
        }
        info!(turns = self.history.len() / 2, "Chat session ended");
        Ok(())
    }
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await.map_err(io_error)?;
    output.flush().await.map_err(io_error)
}

fn io_error(e: std::io::Error) -> crate::Error {
    crate::Error::Transport(format!("Terminal I/O failed: {}", e))
}
