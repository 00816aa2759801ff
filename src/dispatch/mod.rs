//! Exchange resolution

mod dispatcher;
mod envelope;

pub use dispatcher::{normalize, IntentDispatcher};
pub use envelope::{RemoteFunctionResult, ResultEnvelope};
