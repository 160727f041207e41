//! # rssrelay Service
//!
//! The read-through relay: answer from the store when the cached entry holds
//! enough items, otherwise fetch, normalize, store and answer fresh.
//!
//! ## Collaborators
//!
//! [`FeedRelay`] owns no I/O of its own. It is handed a
//! [`CacheStore`](rssrelay_core::CacheStore), a
//! [`FeedFetcher`](rssrelay_core::FeedFetcher) and a
//! [`FeedNormalizer`](rssrelay_core::FeedNormalizer) at construction and is
//! shared between requests through an `Arc`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rssrelay_cache::MemoryStore;
//! use rssrelay_feed::XmlFeedNormalizer;
//! use rssrelay_fetch::HttpFetcher;
//! use rssrelay_service::{FeedRelay, RelayConfig};
//!
//! let relay = FeedRelay::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(HttpFetcher::new()?),
//!     Arc::new(XmlFeedNormalizer::new()),
//!     RelayConfig::default(),
//! );
//!
//! let response = relay.relay_url("https://example.com/feed.xml", Some(10)).await?;
//! println!("{} items (cached: {})", response.items.len(), response.from_cache);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod relay;

pub use relay::{FeedRelay, RelayConfig, RelayStats};
