//! Datura tweet search client.
//!
//! Provides an implementation of the [`TweetSearch`] trait for the Datura
//! Twitter search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Tweet;
use crate::error::{ConfigError, Error, Result};
use crate::port::outbound::sentiment::TweetSearch;

/// Datura Twitter search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://api.datura.ai/api/twitter-search";

/// Datura search client.
#[derive(Debug)]
pub struct DaturaSearch {
    client: Client,
    api_key: String,
    url: String,
    timeout: Duration,
}

impl DaturaSearch {
    #[must_use]
    pub fn new(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create a client from the `DATURA_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env(url: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("DATURA_API_KEY").map_err(|_| ConfigError::MissingField {
            field: "DATURA_API_KEY",
        })?;
        Ok(Self::new(api_key, url))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
    max_results: usize,
    sort_order: &'static str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Extract posts from a search response.
///
/// A missing or null `data` means no results; anything other than a list of
/// post objects is rejected.
fn tweets_from(response: Response) -> Result<Vec<Tweet>> {
    match response.data {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value @ serde_json::Value::Array(_)) => Ok(serde_json::from_value(value)?),
        Some(other) => Err(Error::Parse(format!(
            "search data is not a list: {}",
            truncate(&other.to_string(), 80)
        ))),
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[async_trait]
impl TweetSearch for DaturaSearch {
    fn name(&self) -> &'static str {
        "datura"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Tweet>> {
        let request = Request {
            query,
            max_results: limit,
            sort_order: "relevancy",
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Connection(e.to_string()))?
            .json::<Response>()
            .await?;

        let tweets = tweets_from(response)?;
        debug!(query, found = tweets.len(), "Tweet search complete");
        Ok(tweets)
    }
}
