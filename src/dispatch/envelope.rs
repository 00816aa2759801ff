//! The single outcome of one exchange

use crate::functions::LocalFunctionResult;
use serde::Serialize;
use serde_json::Value;

/// Result of a function the reasoner ran itself and this agent does not model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteFunctionResult {
    pub name: String,
    /// Passed through untouched
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ResultEnvelope {
    /// Free text, possibly empty
    PlainText(String),
    LocalFunction(LocalFunctionResult),
    RemoteFunction(RemoteFunctionResult),
}

impl ResultEnvelope {
    pub fn kind(&self) -> &'static str {
        match self {
            ResultEnvelope::PlainText(_) => "plain_text",
            ResultEnvelope::LocalFunction(_) => "local_function",
            ResultEnvelope::RemoteFunction(_) => "remote_function",
        }
    }

    pub fn function_name(&self) -> Option<&str> {
        match self {
            ResultEnvelope::PlainText(_) => None,
            ResultEnvelope::LocalFunction(result) => Some(result.function().name()),
            ResultEnvelope::RemoteFunction(result) => Some(&result.name),
        }
    }

    /// Text for a terminal: plain text as is, function results as pretty JSON
    pub fn render(&self) -> String {
        match self {
            ResultEnvelope::PlainText(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|e| {
                format!("<unprintable {} result: {}>", other.kind(), e)
            }),
        }
    }
}
