//! DEX aggregator quotes
//!
//! Quotes are read-only. Tokens may be given as addresses or as symbols known
//! to the per-chain token registry.

mod odos;
pub mod tokens;

pub use odos::{OdosQuoter, SwapQuote, SwapQuoteRequest, SwapQuoter};
pub use tokens::{registry, TokenInfo, TokenRegistry};
