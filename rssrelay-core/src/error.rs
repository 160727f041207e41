//! Error types for rssrelay.
//!
//! Each collaborator has its own error enum so that the relay can decide,
//! per failure, whether to recover locally or fail the request. All of them
//! fold into [`RelayError`], which is what callers of the relay see.

use thiserror::Error;

/// Result type alias using `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

// ═══════════════════════════════════════════════════════════════════════════════
// FETCH ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure to retrieve raw feed content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The host could not be reached, or the transfer broke off.
    #[error("feed unreachable: {0}")]
    Unreachable(String),

    /// The retrieval did not finish within the configured bound.
    #[error("feed retrieval timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The server answered with a non-success status.
    #[error("feed server returned HTTP {status}")]
    BadStatus { status: u16 },
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure to turn raw bytes into feed items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The document is not well-formed XML or not a supported feed format.
    #[error("malformed feed: {0}")]
    MalformedFeed(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure of the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheStoreError {
    /// The store timed out, lost its connection, or rejected the command.
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Invalid input from the transport shell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No feed URL was supplied.
    #[error("A URL is required")]
    MissingUrl,

    /// The item count is not a non-negative integer.
    #[error("Invalid count: {0:?}")]
    InvalidCount(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// RELAY ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Error returned by a relay call.
///
/// Store failures never appear here: the relay recovers from them.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request itself was unusable.
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    /// The source feed could not be retrieved.
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// The source feed could not be parsed.
    #[error("parse failed: {0}")]
    ParseFailed(#[from] ParseError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Returns true if the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::InvalidRequest(_))
    }

    /// Returns true if the upstream feed was unavailable or unusable.
    pub fn is_upstream_error(&self) -> bool {
        matches!(self, RelayError::FetchFailed(_) | RelayError::ParseFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::BadStatus { status: 404 };
        assert!(err.to_string().contains("404"));

        let err = FetchError::Timeout { seconds: 10 };
        assert!(err.to_string().contains("10s"));

        assert_eq!(RequestError::MissingUrl.to_string(), "A URL is required");
    }

    #[test]
    fn test_error_classification() {
        assert!(RelayError::from(RequestError::MissingUrl).is_client_error());
        assert!(RelayError::from(RequestError::InvalidCount("x".into())).is_client_error());
        assert!(!RelayError::from(RequestError::MissingUrl).is_upstream_error());

        assert!(RelayError::from(FetchError::Timeout { seconds: 1 }).is_upstream_error());
        assert!(RelayError::from(ParseError::MalformedFeed("x".into())).is_upstream_error());
        assert!(!RelayError::from(FetchError::Unreachable("x".into())).is_client_error());

        let config = RelayError::Config("bad".into());
        assert!(!config.is_client_error());
        assert!(!config.is_upstream_error());
    }

    #[test]
    fn test_conversion_keeps_kind() {
        let err: RelayError = FetchError::BadStatus { status: 503 }.into();
        assert!(matches!(
            err,
            RelayError::FetchFailed(FetchError::BadStatus { status: 503 })
        ));
    }
}
