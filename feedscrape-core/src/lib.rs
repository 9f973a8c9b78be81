// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `feedscrape` Core
//!
//! Core types, models, and traits shared by the other `feedscrape` crates.
//!
//! ## Key Types
//!
//! ### Session Types
//! - [`CookieDescriptor`] - A cookie exactly as stored in the session file
//! - [`SessionCookie`] - A decoded cookie with an absolute expiry
//! - [`SameSite`] - Same-site policy of a cookie
//!
//! ### Timeline Types
//! - [`PostRecord`] - One fetched post, as exported to CSV
//! - [`Cursor`] - Opaque pagination token (empty = end of stream)
//! - [`Page`] - One batch of posts plus the cursor for the next batch
//!
//! ### Traits
//! - [`RecordSink`] - Destination that fetched posts are written to

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Session types
    CookieDescriptor,
    SameSite,
    SessionCookie,
    // Timeline types
    Cursor,
    Page,
    PostRecord,
};

// Re-export traits
pub use traits::RecordSink;

/// Default base URL of the platform's web API.
pub const DEFAULT_API_BASE: &str = "https://x.com/i/api";
