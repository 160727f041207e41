//! Read-through relay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use rssrelay_core::constants::{
    cache_key, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_ITEMS_TO_CACHE_PER_FEED, DEFAULT_ITEM_COUNT,
};
use rssrelay_core::error::{RequestError, Result};
use rssrelay_core::traits::{CacheStore, FeedFetcher, FeedNormalizer};
use rssrelay_core::types::{CachedItems, FeedItem, FeedRequest, RelayResponse};

/// Relay configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Count used when a caller does not give one
    pub default_count: usize,
    /// Cap on the items written to the store per feed
    pub items_to_cache_per_feed: usize,
    /// Store entry lifetime, in seconds
    pub cache_ttl_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_ITEM_COUNT,
            items_to_cache_per_feed: DEFAULT_ITEMS_TO_CACHE_PER_FEED,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

impl RelayConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default count.
    pub fn default_count(mut self, count: usize) -> Self {
        self.default_count = count;
        self
    }

    /// Sets the per-feed cache cap.
    pub fn items_to_cache_per_feed(mut self, cap: usize) -> Self {
        self.items_to_cache_per_feed = cap;
        self
    }

    /// Sets the store TTL.
    pub fn cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    /// Store TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Snapshot of relay counters since startup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    /// Requests answered from the store
    pub cache_hits: u64,
    /// Requests that went to the source feed
    pub cache_misses: u64,
    /// Store reads or writes that failed
    pub store_errors: u64,
    /// Fetch or parse failures returned to callers
    pub upstream_failures: u64,
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    store_errors: AtomicU64,
    upstream_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RelayStats {
        RelayStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serves feed items from the store, falling back to the source feed.
///
/// Store failures never fail a request: a failed read is a miss and a failed
/// write is logged and dropped. Fetch and parse failures do fail it, with no
/// stale or partial result.
pub struct FeedRelay {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn FeedFetcher>,
    normalizer: Arc<dyn FeedNormalizer>,
    config: RelayConfig,
    counters: Counters,
}

impl FeedRelay {
    /// Creates a relay over the given collaborators.
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn FeedFetcher>,
        normalizer: Arc<dyn FeedNormalizer>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer,
            config,
            counters: Counters::default(),
        }
    }

    /// Returns the relay configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Returns the counters since startup.
    pub fn stats(&self) -> RelayStats {
        self.counters.snapshot()
    }

    /// Relays `url`, using the configured default when `count` is `None`.
    pub async fn relay_url(&self, url: &str, count: Option<usize>) -> Result<RelayResponse> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RequestError::MissingUrl.into());
        }
        let request = FeedRequest::new(url, count.unwrap_or(self.config.default_count));
        self.relay(&request).await
    }

    /// Returns the first `requested_count` items of the feed.
    ///
    /// A cached entry is used only when it holds at least `requested_count`
    /// items; its age within the TTL is not considered.
    #[instrument(skip(self, request), fields(url = %request.url, count = request.requested_count))]
    pub async fn relay(&self, request: &FeedRequest) -> Result<RelayResponse> {
        let key = cache_key(&request.url);
        let count = request.requested_count;

        if let Some(cached) = self.lookup(&key).await {
            if cached.satisfies(count) {
                Counters::bump(&self.counters.cache_hits);
                debug!(cached = cached.len(), "Serving from cache");
                return Ok(RelayResponse::truncated(cached.items, count, true));
            }
            debug!(cached = cached.len(), "Cached entry too short, refreshing");
        }
        Counters::bump(&self.counters.cache_misses);

        let items = self.fetch_items(&request.url).await?;
        self.store_items(&key, &items).await;

        info!(items = items.len(), cached = false, "Relayed fresh feed");
        Ok(RelayResponse::truncated(items, count, false))
    }

    async fn lookup(&self, key: &str) -> Option<CachedItems> {
        match self.store.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str::<CachedItems>(&payload) {
                Ok(cached) => Some(cached),
                Err(e) => {
                    warn!(key, error = %e, "Discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                Counters::bump(&self.counters.store_errors);
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_items(&self, url: &str) -> Result<Vec<FeedItem>> {
        let raw = match self.fetcher.fetch(url).await {
            Ok(raw) => raw,
            Err(e) => {
                Counters::bump(&self.counters.upstream_failures);
                warn!(error = %e, "Fetch failed");
                return Err(e.into());
            }
        };

        self.normalizer.normalize(&raw).map_err(|e| {
            Counters::bump(&self.counters.upstream_failures);
            warn!(error = %e, bytes = raw.len(), "Parse failed");
            e.into()
        })
    }

    async fn store_items(&self, key: &str, items: &[FeedItem]) {
        let payload = CachedItems::capped(items, self.config.items_to_cache_per_feed);
        let json = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(e) => {
                error!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        match self
            .store
            .set_with_expiry(key, &json, self.config.cache_ttl())
            .await
        {
            Ok(()) => debug!(key, stored = payload.len(), "Cached feed items"),
            Err(e) => {
                Counters::bump(&self.counters.store_errors);
                warn!(key, error = %e, "Cache write failed");
            }
        }
    }
}
