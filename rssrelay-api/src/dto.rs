//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};

use rssrelay_service::RelayStats;

/// Query string of `GET /v1/feed`.
///
/// Everything is kept as text so that validation errors are reported by
/// the relay's own rules rather than by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Feed URL
    pub url: Option<String>,
    /// Number of items wanted
    pub count: Option<String>,
    /// API key
    pub key: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Relay counters since startup
    pub relay: RelayStats,
}
