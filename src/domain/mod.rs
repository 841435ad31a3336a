//! Exchange-agnostic domain types.
//!
//! - [`id`] - Query keys and job identifiers
//! - [`dividend`] - Dividend records and query results
//! - [`sentiment`] - Bounded sentiment scores and social posts
//! - [`trade`] - Trade jobs, decisions and outcomes

pub mod dividend;
pub mod id;
pub mod sentiment;
pub mod trade;

pub use dividend::{DividendRecord, Dividends};
pub use id::{JobId, QueryKey, SubnetId};
pub use sentiment::{Sentiment, SentimentScore, Tweet};
pub use trade::{OutcomeStatus, TradeAction, TradeDecision, TradeJob, TradeOutcome};
