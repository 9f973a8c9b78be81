//! Session cookie types.
//!
//! A session file holds a JSON array of [`CookieDescriptor`]s, usually
//! exported from a logged-in browser. Each descriptor is decoded into a
//! [`SessionCookie`] with an absolute expiry instead of a Unix timestamp.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// ============================================================================
// SameSite
// ============================================================================

/// Same-site policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SameSite {
    /// `SameSite=Lax`.
    Lax,
    /// `SameSite=Strict`.
    Strict,
    /// `SameSite=None`.
    None,
    /// No explicit policy; the user agent default applies.
    #[default]
    Default,
}

impl SameSite {
    /// Parses the `sameSite` attribute of a descriptor.
    ///
    /// Unknown or missing values map to [`SameSite::Default`]. Browser
    /// extensions write `no_restriction` for `None`.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("lax") => Self::Lax,
            Some("strict") => Self::Strict,
            Some("none" | "no_restriction") => Self::None,
            _ => Self::Default,
        }
    }

    /// Returns the attribute value written back to a descriptor.
    pub fn as_attribute(&self) -> Option<&'static str> {
        match self {
            Self::Lax => Some("Lax"),
            Self::Strict => Some("Strict"),
            Self::None => Some("None"),
            Self::Default => None,
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_attribute().unwrap_or("Default"))
    }
}

// ============================================================================
// Cookie Descriptor
// ============================================================================

/// A cookie as stored in the session file.
///
/// Every field is optional on disk; missing strings decode as empty, missing
/// flags as `false` and a missing expiry as "no expiry".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieDescriptor {
    /// Cookie name.
    #[serde(default)]
    pub name: String,
    /// Cookie value.
    #[serde(default)]
    pub value: String,
    /// Domain the cookie belongs to.
    #[serde(default)]
    pub domain: String,
    /// Path the cookie is valid for.
    #[serde(default)]
    pub path: String,
    /// Expiry as Unix seconds. Zero, negative or absent means no expiry.
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
    /// Whether the cookie is HTTP-only.
    #[serde(default)]
    pub http_only: bool,
    /// Whether the cookie requires HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Same-site policy (`Lax`, `Strict`, `None`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

// ============================================================================
// Session Cookie
// ============================================================================

/// A decoded session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie belongs to.
    pub domain: String,
    /// Path the cookie is valid for.
    pub path: String,
    /// Expiration time, `None` for a cookie without expiry.
    pub expires: Option<DateTime<Utc>>,
    /// Whether the cookie is HTTP-only.
    pub http_only: bool,
    /// Whether the cookie requires HTTPS.
    pub secure: bool,
    /// Same-site policy.
    pub same_site: SameSite,
}

impl SessionCookie {
    /// Returns true if the cookie expired before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp < now)
    }

    /// Returns true if the cookie is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the cookie belongs to `domain` or one of its subdomains.
    ///
    /// A cookie without a domain matches any domain.
    pub fn matches_domain(&self, domain: &str) -> bool {
        let own = self.domain.trim_start_matches('.');
        if own.is_empty() {
            return true;
        }
        let domain = domain.trim_start_matches('.');
        own.eq_ignore_ascii_case(domain)
            || own
                .to_ascii_lowercase()
                .strip_suffix(&domain.to_ascii_lowercase())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Encodes the cookie back into its on-disk form.
    ///
    /// A cookie without expiry is written with `expires: 0`.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_descriptor(&self) -> CookieDescriptor {
        CookieDescriptor {
            name: self.name.clone(),
            value: self.value.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
            expires: Some(self.expires.map_or(0.0, |exp| exp.timestamp() as f64)),
            http_only: self.http_only,
            secure: self.secure,
            same_site: self.same_site.as_attribute().map(str::to_string),
        }
    }
}

impl TryFrom<CookieDescriptor> for SessionCookie {
    type Error = CoreError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(desc: CookieDescriptor) -> Result<Self, Self::Error> {
        let expires = match desc.expires {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                // Fractional seconds are dropped.
                let expiry = Utc.timestamp_opt(secs.trunc() as i64, 0).single().ok_or_else(|| {
                    CoreError::InvalidData(format!(
                        "cookie {:?} has an out-of-range expiry: {secs}",
                        desc.name
                    ))
                })?;
                Some(expiry)
            }
            _ => None,
        };

        Ok(Self {
            same_site: SameSite::from_attribute(desc.same_site.as_deref()),
            name: desc.name,
            value: desc.value,
            domain: desc.domain,
            path: desc.path,
            expires,
            http_only: desc.http_only,
            secure: desc.secure,
        })
    }
}
