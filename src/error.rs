//! Failure taxonomy for CMS fetches and image caching.
//!
//! None of these errors escape the fallback operations; they exist so the
//! inner `try_*` operations can be tested and logged precisely.
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("CMS base URL is not configured")]
    Unconfigured,

    #[error("not found (404): {url}")]
    NotFound { url: String },

    #[error("unauthenticated (401): check the API token")]
    Unauthenticated,

    #[error("forbidden (403): the API token lacks permission")]
    Forbidden,

    #[error("server error ({status})")]
    ServerError { status: StatusCode },

    #[error("unexpected HTTP status {status}")]
    Http { status: StatusCode },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("response did not match the expected schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no file name in media URL: {0}")]
    MissingFileName(String),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

impl FetchError {
    /// Classify a non-success status.
    pub fn from_status(status: StatusCode, url: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => FetchError::NotFound {
                url: url.to_string(),
            },
            StatusCode::UNAUTHORIZED => FetchError::Unauthenticated,
            StatusCode::FORBIDDEN => FetchError::Forbidden,
            s if s.is_server_error() => FetchError::ServerError { status: s },
            s => FetchError::Http { status: s },
        }
    }

    /// Map a transport error, folding timeouts into [`FetchError::Timeout`].
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Network(err)
        }
    }

    /// Short diagnostic phrase used in log lines.
    pub fn notice(&self) -> &'static str {
        match self {
            FetchError::Unconfigured => "unconfigured",
            FetchError::NotFound { .. } => "not found",
            FetchError::Unauthenticated => "unauthenticated",
            FetchError::Forbidden => "forbidden",
            FetchError::ServerError { .. } => "server error",
            FetchError::Http { .. } => "unexpected status",
            FetchError::Timeout(_) => "timeout",
            FetchError::Network(_) => "network error",
            FetchError::InvalidUrl(_) => "invalid url",
            FetchError::Parse(_) => "parse error",
            FetchError::MissingFileName(_) => "missing file name",
            FetchError::Filesystem(_) => "filesystem error",
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            FetchError::Unauthenticated => Some(StatusCode::UNAUTHORIZED),
            FetchError::Forbidden => Some(StatusCode::FORBIDDEN),
            FetchError::ServerError { status } | FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }
}
