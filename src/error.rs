use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The upstream dividend source did not answer within its deadline.
    #[error("upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// The upstream dividend source failed or returned a malformed payload.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("dispatch unavailable: {0}")]
    DispatchUnavailable(String),

    #[error("sentiment analysis failed: {0}")]
    Analyzer(String),

    #[error("trade execution failed: {0}")]
    Executor(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Whether retrying the failed call could succeed.
    ///
    /// Configuration problems are permanent; everything else that can come
    /// back from an external call is treated as transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::Config(_) | Error::Url(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
