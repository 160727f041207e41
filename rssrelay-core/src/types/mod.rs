//! Domain types for rssrelay.
//!
//! - [`FeedItem`]: one normalized entry of a feed
//! - [`CachedItems`]: the payload stored per feed URL
//! - [`FeedRequest`]: a validated relay request
//! - [`RelayResponse`]: what the relay hands back
//! - [`FeedDialect`]: the syndication format a document was written in

mod dialect;
mod item;
mod request;

pub use dialect::*;
pub use item::*;
pub use request::*;
