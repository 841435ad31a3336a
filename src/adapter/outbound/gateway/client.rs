//! HTTP client for the chain gateway.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::error::Result;

/// Shared connection settings for gateway calls.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`](crate::error::Error::Url) if `base_url` is not a
    /// valid URL.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Relative joins replace the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            api_key,
            timeout,
        })
    }

    /// Full URL for a gateway path such as `"dividends"`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.timeout);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}
