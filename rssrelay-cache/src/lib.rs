//! Cache store adapters for rssrelay.
//!
//! Both stores implement [`rssrelay_core::CacheStore`] and keep payloads
//! opaque:
//!
//! - [`RedisStore`]: Redis `GET`/`SETEX` through a reconnecting connection manager
//! - [`MemoryStore`]: in-process map with per-entry TTL and bounded capacity

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
mod redis_store;

pub use memory::{MemoryStore, MemoryStoreConfig, StoreStats};
pub use redis_store::{RedisStore, RedisStoreConfig};
