use reqwest::{header::HeaderMap, StatusCode};
use thiserror::Error;

/// Failures surfaced by a catalog fetch.
///
/// Malformed individual entries never show up here; they are dropped by
/// [`crate::models::parse_movies`].
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Requested page was below 1.
    #[error("page must be at least 1 (got {0})")]
    InvalidPage(u32),
    /// Connectivity problem or timeout before a response arrived.
    #[error("network error: {message}")]
    Network {
        /// Human-readable summary.
        message: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The catalog answered with a status other than 200.
    #[error("catalog returned HTTP {status}: {message}")]
    Http {
        /// Response status.
        status: StatusCode,
        /// Response headers.
        headers: HeaderMap,
        /// Catalog `status_message` or response text.
        message: String,
    },
    /// The response body could not be interpreted as a listing.
    #[error("malformed catalog response: {message}")]
    Parse {
        /// Human-readable summary.
        message: String,
        /// JSON error, when the body was not JSON at all.
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl CatalogError {
    pub(crate) fn network(source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            "unable to connect to catalog".to_string()
        } else {
            source.to_string()
        };
        CatalogError::Network { message, source }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        CatalogError::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status for [`CatalogError::Http`], or the status attached to a transport error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogError::Http { status, .. } => Some(*status),
            CatalogError::Network { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Response headers, when a response was received.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            CatalogError::Http { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Whether the request failed because it ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CatalogError::Network { source, .. } if source.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn http_error_exposes_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let err = CatalogError::Http {
            status: StatusCode::UNAUTHORIZED,
            headers,
            message: "Invalid API key".to_string(),
        };

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(
            err.headers()
                .and_then(|headers| headers.get(CONTENT_TYPE))
                .and_then(|value| value.to_str().ok()),
            Some("application/json")
        );
        assert!(!err.is_timeout());
        assert_eq!(
            err.to_string(),
            "catalog returned HTTP 401 Unauthorized: Invalid API key"
        );
    }

    #[test]
    fn parse_error_has_no_status() {
        let err = CatalogError::parse("missing results array");
        assert_eq!(err.status(), None);
        assert!(err.headers().is_none());
        assert_eq!(
            err.to_string(),
            "malformed catalog response: missing results array"
        );
    }
}
