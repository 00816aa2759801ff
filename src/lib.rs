//! Trading intent agent
//!
//! The intent-resolution and result-aggregation layer of a conversational
//! trading assistant:
//! - Submit the conversation to a remote reasoner, advertising the local functions
//! - Turn its answer into exactly one typed `ResultEnvelope`
//! - Run trader analytics, including a concurrent four-way aggregation
//! - Quote swaps through the Odos DEX aggregator
//!
//! # Credentials
//!
//! - Analytics sessions are memoized per backend and principal in `TokenCache`
//! - A rejected session is refreshed once and the query retried once
//! - Secrets come only from the environment and never appear in logs

pub mod analytics;
pub mod audit;
pub mod cache;
pub mod config;
pub mod dex;
pub mod dispatch;
pub mod functions;
pub mod reasoner;
pub mod runner;

mod error;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use cache::{Credential, TokenCache};
pub use config::Config;
pub use dispatch::{IntentDispatcher, RemoteFunctionResult, ResultEnvelope};
pub use error::{Error, Result};
pub use functions::{FunctionRegistry, FunctionSpec, LocalFunctionResult};
pub use runner::AgentRunner;
