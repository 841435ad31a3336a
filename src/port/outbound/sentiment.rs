//! Sentiment analysis ports.

use async_trait::async_trait;

use crate::domain::{Sentiment, SubnetId, Tweet};
use crate::error::Result;

/// Search over recent social posts.
#[async_trait]
pub trait TweetSearch: Send + Sync {
    /// Return the provider name for logging.
    fn name(&self) -> &'static str;

    /// Return up to `limit` posts matching `query`, most relevant first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Tweet>>;
}

/// Produces one bounded sentiment score per subnet.
///
/// Failures are reported as [`Error::Analyzer`](crate::error::Error::Analyzer);
/// "nothing to analyze" is [`Sentiment::NoData`], not an error.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// Return the analyzer name for logging.
    fn name(&self) -> &'static str;

    /// Score current sentiment about `subnet_id`.
    async fn score(&self, subnet_id: SubnetId) -> Result<Sentiment>;
}
