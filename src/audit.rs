//! Audit trail
//!
//! Appends one JSON line per exchange outcome. Write failures are logged and
//! never fail the exchange.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const RESULT_PREVIEW_CHARS: usize = 1000;

/// One exchange as recorded in the trail
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRecord {
    pub timestamp: DateTime<Utc>,
    pub exchange_id: Uuid,
    pub routing_context: String,
    /// `plain_text`, `local_function`, `remote_function` or `error`
    pub kind: &'static str,
    pub function: Option<String>,
    pub status: &'static str,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ExchangeRecord {
    pub fn new(exchange_id: Uuid, routing_context: &str, duration_ms: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            exchange_id,
            routing_context: routing_context.to_string(),
            kind: "error",
            function: None,
            status: "error",
            result: None,
            error: None,
            duration_ms,
        }
    }

    pub fn succeeded(
        mut self,
        kind: &'static str,
        function: Option<String>,
        result: Option<Value>,
    ) -> Self {
        self.kind = kind;
        self.function = function;
        self.status = "success";
        self.result = result.map(|v| truncate_result(&v));
        self
    }

    pub fn failed(mut self, function: Option<String>, error: &crate::Error) -> Self {
        self.kind = "error";
        self.function = function;
        self.status = "error";
        self.error = Some(error.to_string());
        self
    }
}

struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, record: &ExchangeRecord) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(record)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// JSONL audit log shared by every exchange of a dispatcher
#[derive(Clone)]
pub struct AuditLog {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter { path: path.into() })),
        }
    }

    pub async fn path(&self) -> PathBuf {
        self.writer.lock().await.path.clone()
    }

    pub async fn record(&self, record: &ExchangeRecord) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(record) {
            tracing::warn!(
                path = %writer.path.display(),
                error = %e,
                "Failed to write audit log entry"
            );
        }
    }
}

/// Keep large payloads out of the trail
fn truncate_result(result: &Value) -> Value {
    let s = serde_json::to_string(result).unwrap_or_default();
    if s.chars().count() > RESULT_PREVIEW_CHARS {
        let preview: String = s.chars().take(RESULT_PREVIEW_CHARS).collect();
        serde_json::json!(format!("{}... [truncated]", preview))
    } else {
        result.clone()
    }
}
