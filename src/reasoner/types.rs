//! Wire types exchanged with the reasoning service

use crate::functions::{FunctionCall, FunctionSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Request sent for one exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonerRequest {
    pub messages: Vec<ChatMessage>,
    /// Routing context selecting the prompt set on the reasoner side
    pub project: String,
    /// Functions the reasoner may ask this agent to run
    pub functions: Vec<FunctionSpec>,
}

/// Outcome of one tool invocation as reported by the reasoner
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawToolResult")]
pub enum ToolResolution {
    /// The reasoner chose a function but left execution to us
    Pending(FunctionCall),
    /// The reasoner already ran the function remotely
    Resolved { name: String, value: Value },
}

impl ToolResolution {
    pub fn name(&self) -> &str {
        match self {
            ToolResolution::Pending(call) => &call.name,
            ToolResolution::Resolved { name, .. } => name,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ToolResolution::Resolved { .. })
    }
}

#[derive(Debug, Deserialize)]
struct RawToolResult {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
    /// `Some(Value::Null)` when the key is present with a null payload
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    resolved: Option<bool>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawToolResult> for ToolResolution {
    type Error = String;

    fn try_from(raw: RawToolResult) -> Result<Self, Self::Error> {
        if raw.name.trim().is_empty() {
            return Err("tool result without a function name".to_string());
        }

        match (raw.resolved.unwrap_or(false), raw.result) {
            (true, Some(value)) => Ok(ToolResolution::Resolved {
                name: raw.name,
                value,
            }),
            // Flagged resolved without a result key: run it here instead
            _ => {
                let arguments = match raw.arguments {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(encoded)) => encoded,
                    Some(other) => other.to_string(),
                };
                Ok(ToolResolution::Pending(FunctionCall {
                    name: raw.name,
                    arguments,
                }))
            }
        }
    }
}

/// What the reasoner answered for one exchange
///
/// Tool results stay undecoded until asked for. Only the first one is ever
/// acted on, so a broken entry behind it cannot fail the exchange.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReasonerResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tool_results: Vec<Value>,
}

impl ReasonerResponse {
    /// Decode the tool result to act on
    pub fn first_tool_result(&self) -> Result<Option<ToolResolution>, serde_json::Error> {
        self.tool_results
            .first()
            .map(ToolResolution::deserialize)
            .transpose()
    }

    /// Names of the tool results after the first, `?` where none can be read
    pub fn ignored_tool_names(&self) -> Vec<String> {
        self.tool_results
            .iter()
            .skip(1)
            .map(|raw| {
                raw.get("name")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .unwrap_or("?")
                    .to_string()
            })
            .collect()
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
