//! Defaults and store layout for rssrelay.
//!
//! The numeric defaults match the values the relay falls back to when the
//! corresponding environment variables are absent.

// ═══════════════════════════════════════════════════════════════════════════════
// RELAY DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of items returned when a request does not name a count.
pub const DEFAULT_ITEM_COUNT: usize = 25;

/// Maximum number of items written to the store for a single feed.
pub const DEFAULT_ITEMS_TO_CACHE_PER_FEED: usize = 25;

/// Lifetime of a cache entry in seconds, measured from write time.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSPORT DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Upper bound on a single feed retrieval, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Number of redirect hops the fetcher follows before giving up.
pub const DEFAULT_FETCH_MAX_REDIRECTS: usize = 5;

/// Largest feed body the fetcher accepts, in bytes (5 MiB).
pub const DEFAULT_FETCH_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Upper bound on a single store round trip, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

// ═══════════════════════════════════════════════════════════════════════════════
// STORE LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix of every cache key.
pub const CACHE_KEY_PREFIX: &str = "items:";

/// Derives the store key for a feed URL.
///
/// The URL is used verbatim: two spellings of the same feed are two entries.
pub fn cache_key(url: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_layout() {
        assert_eq!(
            cache_key("https://example.com/feed.xml"),
            "items:https://example.com/feed.xml"
        );
    }

    #[test]
    fn test_cache_key_is_verbatim() {
        assert_ne!(
            cache_key("https://example.com/feed"),
            cache_key("https://EXAMPLE.com/feed")
        );
        assert_eq!(cache_key(""), CACHE_KEY_PREFIX);
    }
}
