//! Session-cookie loading.
//!
//! A session file is a JSON array of cookie descriptors exported from a
//! logged-in browser:
//!
//! ```json
//! [
//!   {"name": "auth_token", "value": "...", "domain": ".x.com", "path": "/",
//!    "expires": 1767225600, "httpOnly": true, "secure": true, "sameSite": "None"},
//!   {"name": "ct0", "value": "...", "domain": ".x.com", "path": "/",
//!    "expires": 1767225600, "httpOnly": false, "secure": true, "sameSite": "Lax"}
//! ]
//! ```
//!
//! Cookie data is sensitive; values never appear in logs.

use chrono::Utc;
use feedscrape_core::{CookieDescriptor, SessionCookie};
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::error::SessionError;

/// Name of the cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "ct0";

/// Name of the cookie carrying the authenticated session.
pub const AUTH_COOKIE: &str = "auth_token";

/// A set of session cookies loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct Session {
    cookies: Vec<SessionCookie>,
}

impl Session {
    /// Wraps already decoded cookies.
    pub fn from_cookies(cookies: Vec<SessionCookie>) -> Self {
        Self { cookies }
    }

    /// Loads and decodes a session file.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, SessionError> {
        debug!("Loading session file");

        let bytes = tokio::fs::read(path).await.map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let cookies = decode(&bytes, &path.display().to_string())?;

        debug!(count = cookies.len(), "Session cookies decoded");
        Ok(Self { cookies })
    }

    /// Returns all cookies.
    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    /// Keeps only the cookies belonging to one of `domains`.
    pub fn for_domains<S: AsRef<str>>(&self, domains: &[S]) -> Self {
        let (kept, dropped): (Vec<_>, Vec<_>) = self
            .cookies
            .iter()
            .cloned()
            .partition(|c| domains.iter().any(|d| c.matches_domain(d.as_ref())));

        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Ignoring cookies of other domains");
        }
        Self { cookies: kept }
    }

    /// Looks up a cookie by name.
    pub fn get(&self, name: &str) -> Option<&SessionCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Returns the CSRF token the platform expects in `x-csrf-token`.
    pub fn csrf_token(&self) -> Option<&str> {
        self.get(CSRF_COOKIE).map(|c| c.value.as_str())
    }

    /// Returns true if the session carries an unexpired authentication cookie.
    pub fn has_auth_token(&self) -> bool {
        self.get(AUTH_COOKIE)
            .is_some_and(|c| !c.value.is_empty() && !c.is_expired())
    }

    /// Builds a `Cookie` header value, skipping expired cookies.
    pub fn cookie_header(&self) -> String {
        let now = Utc::now();
        self.cookies
            .iter()
            .filter(|c| {
                let expired = c.is_expired_at(now);
                if expired {
                    warn!(cookie = %c.name, "Skipping expired session cookie");
                }
                !expired
            })
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Decodes a JSON array of cookie descriptors.
pub fn decode_cookies(bytes: &[u8]) -> Result<Vec<SessionCookie>, SessionError> {
    decode(bytes, "<memory>")
}

fn decode(bytes: &[u8], path: &str) -> Result<Vec<SessionCookie>, SessionError> {
    let descriptors: Vec<CookieDescriptor> =
        serde_json::from_slice(bytes).map_err(|source| SessionError::Decode {
            path: path.to_string(),
            source,
        })?;

    descriptors
        .into_iter()
        .map(|d| SessionCookie::try_from(d).map_err(SessionError::from))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
