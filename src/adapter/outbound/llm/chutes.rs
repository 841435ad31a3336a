//! Chutes LLM client.
//!
//! Provides an implementation of the [`Llm`] trait for a Chutes predict
//! endpoint, which takes a raw prompt and returns a single `output` string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::port::outbound::llm::Llm;

/// Default predict endpoint for the sentiment chute.
pub const DEFAULT_ENDPOINT: &str =
    "https://api.chutes.ai/api/v1/predict/20acffc0-0c5f-58e3-97af-21fc0b261ec4";

/// Chutes predict client.
#[derive(Debug)]
pub struct Chutes {
    client: Client,
    api_key: String,
    endpoint: String,
    temperature: f64,
    top_p: f64,
    timeout: Duration,
}

impl Chutes {
    /// Create a client for `endpoint`.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        temperature: f64,
        top_p: f64,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            temperature,
            top_p,
            timeout: Duration::from_secs(30),
        }
    }

    /// Create a client from the `CHUTES_API_KEY` environment variable with
    /// low-temperature sampling.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set.
    pub fn from_env(endpoint: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("CHUTES_API_KEY").map_err(|_| ConfigError::MissingField {
            field: "CHUTES_API_KEY",
        })?;
        Ok(Self::new(api_key, endpoint, 0.1, 0.9))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct Request<'a> {
    input: &'a str,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f64,
    top_p: f64,
}

#[derive(Deserialize)]
struct Response {
    output: Option<String>,
}

#[async_trait]
impl Llm for Chutes {
    fn name(&self) -> &'static str {
        "chutes"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = Request {
            input: prompt,
            options: Options {
                temperature: self.temperature,
                top_p: self.top_p,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Connection(e.to_string()))?
            .json::<Response>()
            .await?;

        response
            .output
            .map(|o| o.trim().to_string())
            .ok_or_else(|| Error::Parse("chutes response has no output".into()))
    }
}
