//! Domain models for feedscrape.
//!
//! ## Submodules
//!
//! - [`cookie`] - Session cookie types (CookieDescriptor, SessionCookie, SameSite)
//! - [`post`] - Post records and timeline pages (PostRecord, Cursor, Page)

mod cookie;
mod post;

// Re-export everything at the models level
pub use cookie::{CookieDescriptor, SameSite, SessionCookie};
pub use post::{Cursor, Page, PostRecord};
