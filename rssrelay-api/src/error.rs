//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use rssrelay_core::error::{RelayError, RequestError};

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// Missing or malformed request parameters.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "INVALID_REQUEST")
    }

    /// Missing or wrong API key.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Invalid key", "UNAUTHORIZED")
    }

    /// The source feed could not be retrieved.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message, "UPSTREAM_UNAVAILABLE")
    }

    /// The source feed could not be parsed.
    pub fn upstream_malformed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message, "UPSTREAM_MALFORMED")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of this error.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Message
    pub error: String,
    /// Machine-readable code
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::invalid_request(err.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidRequest(e) => e.into(),
            RelayError::FetchFailed(e) => ApiError::upstream_unavailable(e.to_string()),
            RelayError::ParseFailed(e) => ApiError::upstream_malformed(e.to_string()),
            RelayError::Config(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rssrelay_core::error::{FetchError, ParseError};
    use test_case::test_case;

    #[test_case(RequestError::MissingUrl.into(), StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST" ; "missing url")]
    #[test_case(RequestError::InvalidCount("x".into()).into(), StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST" ; "bad count")]
    #[test_case(FetchError::Timeout { seconds: 10 }.into(), StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE" ; "fetch timeout")]
    #[test_case(FetchError::BadStatus { status: 404 }.into(), StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE" ; "fetch status")]
    #[test_case(ParseError::MalformedFeed("x".into()).into(), StatusCode::BAD_GATEWAY, "UPSTREAM_MALFORMED" ; "parse")]
    #[test_case(RelayError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR" ; "config")]
    fn test_relay_error_mapping(err: RelayError, status: StatusCode, code: &str) {
        let api = ApiError::from(err);
        assert_eq!(api.status(), status);
        assert_eq!(api.code(), code);
    }

    #[test]
    fn test_missing_url_message() {
        let api = ApiError::from(RelayError::from(RequestError::MissingUrl));
        assert_eq!(api.message, "A URL is required");
    }

    #[test]
    fn test_internal_message_is_generic() {
        let api = ApiError::from(RelayError::Config("redis password is hunter2".into()));
        assert!(!api.message.contains("hunter2"));
    }
}
