//! Core error types for `feedscrape`.

use thiserror::Error;

/// Core error type for `feedscrape` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid data, e.g. a cookie descriptor that cannot be converted.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
