//! reqwest-based fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use rssrelay_core::constants::{
    DEFAULT_FETCH_MAX_BODY_BYTES, DEFAULT_FETCH_MAX_REDIRECTS, DEFAULT_FETCH_TIMEOUT_SECONDS,
};
use rssrelay_core::error::{FetchError, RelayError, Result};
use rssrelay_core::traits::FeedFetcher;

/// User agent sent with every retrieval.
const USER_AGENT: &str = concat!("rssrelay/", env!("CARGO_PKG_VERSION"));

/// Fetcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Upper bound on a whole retrieval (connect, headers, body), in seconds
    pub timeout_seconds: u64,
    /// Redirect hops to follow; 0 returns redirects as bad statuses
    pub max_redirects: usize,
    /// Bodies larger than this are rejected, in bytes
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECONDS,
            max_redirects: DEFAULT_FETCH_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_FETCH_MAX_BODY_BYTES,
        }
    }
}

impl FetchConfig {
    /// Sets the retrieval timeout.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the redirect limit.
    pub fn with_max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    /// Sets the body size limit.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

/// Fetches feed documents over HTTP(S).
pub struct HttpFetcher {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Creates a fetcher with custom configuration.
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(redirect)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configuration this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                seconds: self.config.timeout_seconds,
            }
        } else if err.is_redirect() {
            FetchError::Unreachable(format!(
                "more than {} redirects",
                self.config.max_redirects
            ))
        } else {
            FetchError::Unreachable(err.to_string())
        }
    }

    fn too_large(&self) -> FetchError {
        warn!(limit = self.config.max_body_bytes, "Feed body exceeds size limit");
        FetchError::Unreachable(format!(
            "response body exceeds {} bytes",
            self.config.max_body_bytes
        ))
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Feed server returned non-success status");
            return Err(FetchError::BadStatus {
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_body_bytes;
        if response.content_length().map_or(false, |len| len > limit as u64) {
            return Err(self.too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > limit {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "Fetched feed");
        Ok(body)
    }
}
