//! Relay requests.

use crate::error::RequestError;

/// A validated request for the first items of a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedRequest {
    /// Feed URL, used verbatim as part of the cache key
    pub url: String,
    /// Number of items wanted
    pub requested_count: usize,
}

impl FeedRequest {
    /// Creates a request.
    pub fn new(url: impl Into<String>, requested_count: usize) -> Self {
        Self {
            url: url.into(),
            requested_count,
        }
    }

    /// Builds a request from raw shell parameters.
    ///
    /// A blank `url` is treated as missing. A blank or absent `count` falls
    /// back to `default_count`; anything else must parse as a non-negative
    /// integer.
    pub fn from_params(
        url: Option<&str>,
        count: Option<&str>,
        default_count: usize,
    ) -> Result<Self, RequestError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(RequestError::MissingUrl)?;

        let requested_count = match count.map(str::trim).filter(|c| !c.is_empty()) {
            None => default_count,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| RequestError::InvalidCount(raw.to_string()))?,
        };

        Ok(Self::new(url, requested_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_from_params_defaults_count() {
        let req = FeedRequest::from_params(Some("https://example.com/rss"), None, 25).unwrap();
        assert_eq!(req.url, "https://example.com/rss");
        assert_eq!(req.requested_count, 25);
    }

    #[test_case(Some("10"), 10 ; "explicit count")]
    #[test_case(Some(" 7 "), 7 ; "padded count")]
    #[test_case(Some("0"), 0 ; "zero count")]
    #[test_case(Some(""), 25 ; "empty count uses default")]
    #[test_case(None, 25 ; "absent count uses default")]
    fn test_count_parsing(count: Option<&str>, expected: usize) {
        let req = FeedRequest::from_params(Some("https://example.com/rss"), count, 25).unwrap();
        assert_eq!(req.requested_count, expected);
    }

    #[test_case("-1" ; "negative")]
    #[test_case("ten" ; "word")]
    #[test_case("2.5" ; "fraction")]
    fn test_invalid_count(count: &str) {
        let err = FeedRequest::from_params(Some("https://example.com/rss"), Some(count), 25)
            .unwrap_err();
        assert_eq!(err, RequestError::InvalidCount(count.to_string()));
    }

    #[test_case(None ; "absent")]
    #[test_case(Some("") ; "empty")]
    #[test_case(Some("   ") ; "blank")]
    fn test_missing_url(url: Option<&str>) {
        let err = FeedRequest::from_params(url, Some("5"), 25).unwrap_err();
        assert_eq!(err, RequestError::MissingUrl);
    }

    #[test]
    fn test_missing_url_reported_before_bad_count() {
        let err = FeedRequest::from_params(None, Some("nope"), 25).unwrap_err();
        assert_eq!(err, RequestError::MissingUrl);
    }
}
