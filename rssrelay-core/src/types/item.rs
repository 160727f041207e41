//! Feed items and the payloads built from them.

use serde::{Deserialize, Serialize};

/// A single feed entry, independent of the feed's dialect.
///
/// Field names are part of both the response body and the cached payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Entry title; empty when the feed omits it
    #[serde(default)]
    pub title: String,
    /// Entry link; empty when the feed omits it
    #[serde(default)]
    pub link: String,
    /// Publish timestamp taken from the dialect's date field
    #[serde(default)]
    pub published: Option<String>,
}

impl FeedItem {
    /// Creates a new item.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published,
        }
    }
}

/// The payload stored for one feed URL.
///
/// # Wire Format
/// ```text
/// {"items":[{"title":"..","link":"..","published":".."|null}, ...]}
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedItems {
    /// The first items of the feed, in feed order
    pub items: Vec<FeedItem>,
}

impl CachedItems {
    /// Builds the payload from the first `cap` items of `items`.
    pub fn capped(items: &[FeedItem], cap: usize) -> Self {
        Self {
            items: items.iter().take(cap).cloned().collect(),
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if this payload can answer a request for `count` items.
    pub fn satisfies(&self, count: usize) -> bool {
        self.items.len() >= count
    }
}

/// The result of a relay call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// At most the requested number of items, in feed order
    pub items: Vec<FeedItem>,
    /// Whether the items were served from the store
    #[serde(rename = "from_proxy_cache")]
    pub from_cache: bool,
}

impl RelayResponse {
    /// Creates a response.
    pub fn new(items: Vec<FeedItem>, from_cache: bool) -> Self {
        Self { items, from_cache }
    }

    /// Builds a response from the first `count` items of `items`.
    pub fn truncated(mut items: Vec<FeedItem>, count: usize, from_cache: bool) -> Self {
        items.truncate(count);
        Self::new(items, from_cache)
    }
}
