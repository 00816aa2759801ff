//! Reasoning service boundary
//!
//! The reasoner receives the conversation plus the catalog of local functions
//! and answers with text, a function for us to run, or a function it already ran.

mod client;
mod types;

pub use client::{HttpReasoner, ReasoningBackend};
pub use types::{ChatMessage, ReasonerRequest, ReasonerResponse, Role, ToolResolution};
