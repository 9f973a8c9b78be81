// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # Feedscrape Fetch
//!
//! Session loading, timeline access and the pagination loop.
//!
//! ## Host APIs
//!
//! - [`host::session`] - Session-cookie files exported from a browser
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//!
//! ## Fetching
//!
//! - [`source::PostSource`] - Trait for paginated post sources
//! - [`timeline::TimelineClient`] - Source backed by the web GraphQL API
//! - [`paginator::Paginator`] - Drives a source until the cursor runs out
//! - [`governor::RateLimitGovernor`] - Pauses after a fixed request budget
//!
//! ## Example
//!
//! ```ignore
//! use feedscrape_fetch::{Credentials, Paginator, PostSource, Session, TimelineClient};
//!
//! let session = Session::load(Path::new("session.json")).await?;
//! let client = TimelineClient::new(TimelineClientConfig::default(), &session)?;
//! client.login(&Credentials::new("me", None)).await?;
//!
//! let report = Paginator::new(&client).run("someone", &mut writer).await;
//! println!("{} posts", report.total_fetched);
//! ```

pub mod error;
pub mod governor;
pub mod host;
pub mod paginator;
pub mod source;
pub mod timeline;

// Errors
pub use error::{FetchError, HttpError, SessionError};

// Host APIs
pub use host::{HttpClient, RateLimitInfo, ResponseExt, Session};

// Fetching
pub use governor::{RateLimitGovernor, RateLimitPolicy};
pub use paginator::{PaginationReport, PaginationState, Paginator, StopReason};
pub use source::{Credentials, PostSource, DEFAULT_PAGE_SIZE};
pub use timeline::{TimelineClient, TimelineClientConfig};
