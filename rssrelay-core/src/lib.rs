//! # rssrelay Core
//!
//! Core types, errors, and traits for the rssrelay feed cache.
//!
//! This crate provides the building blocks shared by every other rssrelay crate:
//!
//! - **Types**: feed items, requests, responses, cached payloads and feed dialects
//! - **Errors**: the error taxonomy for fetching, parsing, caching and requests
//! - **Constants**: configuration defaults and the cache key layout
//! - **Traits**: the seams between the relay and its collaborators
//!
//! ## Example
//!
//! ```rust
//! use rssrelay_core::{cache_key, FeedItem, RelayResponse};
//!
//! let item = FeedItem::new("Hello", "https://example.com/hello", None);
//! let response = RelayResponse::new(vec![item], false);
//! let json = serde_json::to_string(&response).unwrap();
//! assert!(json.contains("from_proxy_cache"));
//! assert_eq!(cache_key("https://example.com/feed"), "items:https://example.com/feed");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CacheStoreError, FetchError, ParseError, RelayError, RequestError, Result};
pub use traits::*;
pub use types::*;
