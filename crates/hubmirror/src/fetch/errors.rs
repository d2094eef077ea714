use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while fetching a single resource from the upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response was obtained (connection refused, TLS failure, timeout).
    #[error("Network error requesting {url}: {message}")]
    Transport { url: String, message: String },

    /// The upstream answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body was not the JSON shape the caller expected.
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The quota reset is further away than the configured maximum wait.
    #[error("Rate limit exhausted until {reset_at}, which exceeds the maximum wait of {max_wait:?}")]
    RateLimitWaitExceeded {
        reset_at: DateTime<Utc>,
        max_wait: Duration,
    },

    /// The configured base URL or a derived endpoint URL is malformed.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// The HTTP status, if this error carries one.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[inline]
    pub fn is_status(&self, expected: u16) -> bool {
        self.status() == Some(expected)
    }
}

/// Cap on how much of an error body is kept for diagnostics.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 512;

pub(crate) fn truncate_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
