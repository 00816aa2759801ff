//! Trader analytics
//!
//! Named queries against the analytics (BI) tool, decoded into typed rows.
//! Sessions are memoized in the shared `TokenCache`; requests flagged
//! synthetic are answered from deterministic in-process data.

mod backend;
mod models;
mod query;
mod service;
mod synthetic;

pub use backend::{HttpQueryBackend, QueryBackend, Row, SESSION_HEADER};
pub use models::{
    AggregatedTraderDetail, ProfitBucket, ProfitPoint, SmartTrader, TradeTimeBucket,
    TraderOverview,
};
pub use query::{
    BoundQuery, Metric, QueryParameter, QueryRequest, Timezone, DEFAULT_DURATION_DAYS,
    DEFAULT_RATE_THRESHOLD,
};
pub use service::DataQueryService;
pub use synthetic::SyntheticBackend;
