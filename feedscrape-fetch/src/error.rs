//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for timeline operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds until the rate-limit window resets, if reported.
        retry_after: Option<u64>,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid response from the platform.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The requested account does not exist or is not visible.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(HttpError::Request(err))
    }
}

impl FetchError {
    /// Returns true if the session was rejected by the platform.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Session Error
// ============================================================================

/// Error type for loading a session-cookie file.
///
/// All variants are fatal at startup.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The file could not be read.
    #[error("Failed to read session file {path}: {source}")]
    Io {
        /// Path of the session file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not a JSON array of cookie descriptors.
    #[error("Failed to decode session file {path}: {source}")]
    Decode {
        /// Path of the session file.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A descriptor could not be converted into a cookie.
    #[error("Invalid cookie: {0}")]
    InvalidCookie(#[from] feedscrape_core::CoreError),
}
