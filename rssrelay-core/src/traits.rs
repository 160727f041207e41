//! Common traits for rssrelay.
//!
//! These traits are the seams between the relay and the outside world. The
//! relay only ever talks to them through `Arc<dyn ...>`, so tests can swap in
//! fakes for the store and the network.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CacheStoreError, FetchError, ParseError};
use crate::types::FeedItem;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the external key-value store.
///
/// Payloads are opaque: whatever goes in through `set_with_expiry` comes back
/// unchanged from `get` until the TTL runs out. Expiry is the store's job.
///
/// Implementations might use:
/// - Redis (production)
/// - An in-process map (development/testing)
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the payload stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Stores `value` under `key`, replacing any previous payload, and
    /// expires it after `ttl`.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheStoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// FETCHER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for retrieving raw feed documents.
///
/// Implementations do not retry and do not validate the URL.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Retrieves the document at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NORMALIZER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for turning a raw feed document into items.
pub trait FeedNormalizer: Send + Sync {
    /// Parses `raw` into items, in the order the feed lists them.
    ///
    /// A feed with no items yields an empty vector, not an error.
    fn normalize(&self, raw: &[u8]) -> Result<Vec<FeedItem>, ParseError>;
}
