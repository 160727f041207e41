//! HTTP feed fetcher for rssrelay.
//!
//! Retrieves raw feed documents with a bounded timeout and a limited redirect
//! policy. No retries: a failed retrieval is reported once, as a
//! [`rssrelay_core::FetchError`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod http;

pub use http::{FetchConfig, HttpFetcher};
