//! # rssrelay Feed Normalizer
//!
//! Turns RSS 0.9x/2.0, RSS 1.0 (RDF) and Atom documents into a flat,
//! ordered list of [`FeedItem`](rssrelay_core::FeedItem)s.
//!
//! The dialect is detected from the document root. Title and link are read
//! the same way for every dialect; the publish date is not, see
//! [`date_accessor`].
//!
//! ## Example
//!
//! ```rust
//! use rssrelay_core::FeedDialect;
//! use rssrelay_feed::XmlFeedNormalizer;
//!
//! let xml = br#"<rss version="2.0"><channel>
//!   <item>
//!     <title>One</title><link>https://a/1</link>
//!     <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
//!   </item>
//! </channel></rss>"#;
//!
//! let normalizer = XmlFeedNormalizer::new();
//! let feed = normalizer.parse(xml).unwrap();
//! assert_eq!(feed.dialect, FeedDialect::Rss);
//! assert_eq!(feed.items[0].published.as_deref(), Some("Mon, 01 Jan 2024 10:00:00 GMT"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod entry;
mod normalizer;

pub use entry::{date_accessor, DateAccessor, RawEntry};
pub use normalizer::{ParsedFeed, XmlFeedNormalizer};
