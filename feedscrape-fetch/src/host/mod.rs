//! Host APIs for feedscrape.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`session`] - Session-cookie file loading

pub mod http;
pub mod session;

// Re-export key types
pub use http::{HttpClient, RateLimitInfo, ResponseExt};
pub use session::Session;
