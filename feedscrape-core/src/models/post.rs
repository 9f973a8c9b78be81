//! Post records and timeline pages.
//!
//! - [`PostRecord`] - One post with the metadata exported to CSV
//! - [`Cursor`] - Pagination token
//! - [`Page`] - Result of one timeline fetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Post Record
// ============================================================================

/// Metadata of a single post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostRecord {
    /// When the post was published.
    pub timestamp: DateTime<Utc>,
    /// Full text of the post.
    pub text: String,
    /// Like count.
    pub likes: u64,
    /// Repost count.
    pub reposts: u64,
    /// View count (0 when the platform does not report one).
    pub views: u64,
    /// Handle of the account that published the post.
    pub handle: String,
    /// Whether the post is a repost of another post.
    pub is_repost: bool,
    /// Whether the post is a reply.
    pub is_reply: bool,
    /// Platform identifier of the post.
    pub id: String,
}

// ============================================================================
// Cursor
// ============================================================================

/// Opaque continuation token of a timeline.
///
/// The empty cursor starts a timeline when sent and ends it when received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// The cursor of the first page.
    pub fn start() -> Self {
        Self::default()
    }

    /// Returns true if this cursor marks the end of the stream.
    pub fn is_end(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Page
// ============================================================================

/// One batch of posts returned by a single fetch.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Posts of this page, in timeline order.
    pub posts: Vec<PostRecord>,
    /// Cursor of the following page; empty when the timeline is exhausted.
    pub next_cursor: Cursor,
}

impl Page {
    /// Creates a page.
    pub fn new(posts: Vec<PostRecord>, next_cursor: impl Into<Cursor>) -> Self {
        Self {
            posts,
            next_cursor: next_cursor.into(),
        }
    }

    /// Returns true if no page follows this one.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_cursor_is_end_marker() {
        assert!(Cursor::start().is_end());
        assert!(!Cursor::from("c2").is_end());
    }

    #[test]
    fn test_page_is_last() {
        assert!(Page::new(vec![], "").is_last());
        assert!(!Page::new(vec![PostRecord::default()], "next").is_last());
    }
}
