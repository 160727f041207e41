//! Redis-backed store.
//!
//! Uses a `ConnectionManager`, which reconnects on its own after the server
//! drops the connection. Every command is bounded by a timeout so that a
//! stalled server looks like an outage rather than a hung request.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use rssrelay_core::constants::DEFAULT_STORE_TIMEOUT_MS;
use rssrelay_core::error::CacheStoreError;
use rssrelay_core::traits::CacheStore;

/// Redis store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379/0`
    pub url: String,
    /// Upper bound on a single command, in milliseconds
    pub timeout_ms: u64,
}

impl RedisStoreConfig {
    /// Creates a config for the given URL with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
        }
    }

    /// Sets the per-command timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &redacted(&self.config.url))
            .field("timeout_ms", &self.config.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to the server named in `config`.
    ///
    /// Fails if the URL is invalid or the first connection cannot be made
    /// within the configured timeout.
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, CacheStoreError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| CacheStoreError::Unavailable(format!("invalid Redis URL: {}", e)))?;

        let conn = bounded(config.timeout(), ConnectionManager::new(client)).await?;

        info!(url = %redacted(&config.url), timeout_ms = config.timeout_ms, "Connected to Redis");
        Ok(Self { conn, config })
    }

    /// Returns the configuration this store was built with.
    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = bounded(self.config.timeout(), conn.get(key)).await?;
        debug!(key, hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        bounded::<(), _>(self.config.timeout(), conn.set_ex(key, value, seconds)).await?;
        debug!(key, seconds, "Redis SETEX");
        Ok(())
    }
}

/// Runs a Redis command under `limit`, folding timeouts and Redis errors
/// into `CacheStoreError::Unavailable`.
async fn bounded<T, F>(limit: Duration, command: F) -> Result<T, CacheStoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(limit, command).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(error = %e, "Redis command failed");
            Err(CacheStoreError::Unavailable(e.to_string()))
        }
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "Redis command timed out");
            Err(CacheStoreError::Unavailable(format!(
                "timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

/// Hides the password part of a Redis URL for logging.
fn redacted(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
