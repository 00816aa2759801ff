//! Error types for the trading intent agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Upstream collaborator unreachable or answered with a server error
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed arguments for '{function}': {reason}")]
    MalformedArguments { function: String, reason: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Every branch of an aggregation returned, but the composite is unusable
    #[error("Incomplete aggregate for {address}: {reason}")]
    IncompleteAggregate { address: String, reason: String },

    #[error("Authentication expired for {0}")]
    AuthExpired(String),

    #[error("Malformed result for '{function}': {reason}")]
    MalformedResult { function: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("DEX aggregator error: {0}")]
    Dex(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn malformed_arguments(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedArguments {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_result(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedResult {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn incomplete(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::IncompleteAggregate {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the network path rather than from the payload
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
