//! The post source trait.
//!
//! A [`PostSource`] is anything that can authenticate and hand out a
//! timeline one page at a time. The pagination loop only talks to this
//! trait, so tests drive it with scripted sources instead of the network.

use async_trait::async_trait;
use feedscrape_core::{Cursor, Page};

use crate::error::FetchError;

/// Default number of posts requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Account credentials passed to [`PostSource::login`].
#[derive(Clone, Default)]
pub struct Credentials {
    /// Account handle, without the leading `@`.
    pub username: String,
    /// Password, for sources that support password login.
    pub password: Option<String>,
}

impl Credentials {
    /// Creates credentials for a handle.
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into().trim_start_matches('@').to_string(),
            password,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A paginated source of posts.
///
/// ## Implementing a Source
///
/// ```ignore
/// struct Fixed(Vec<Page>);
///
/// #[async_trait]
/// impl PostSource for Fixed {
///     async fn login(&self, _: &Credentials) -> Result<(), FetchError> {
///         Ok(())
///     }
///
///     async fn fetch_page(&self, _: &str, _: u32, cursor: Cursor) -> Result<Page, FetchError> {
///         let index: usize = cursor.as_str().parse().unwrap_or(0);
///         Ok(self.0[index].clone())
///     }
/// }
/// ```
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Authenticates the account.
    ///
    /// Must succeed before any page is fetched.
    async fn login(&self, credentials: &Credentials) -> Result<(), FetchError>;

    /// Fetches one page of `handle`'s posts starting at `cursor`.
    ///
    /// The start of the timeline is requested with [`Cursor::start`]. The
    /// returned page's cursor is empty once the timeline is exhausted.
    async fn fetch_page(
        &self,
        handle: &str,
        page_size: u32,
        cursor: Cursor,
    ) -> Result<Page, FetchError>;
}
