//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use feedscrape_core::SessionCookie;
use feedscrape_fetch::{PaginationReport, StopReason};
use serde::{Serialize, Serializer};
use std::path::Path;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output of a scrape run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    pub handle: String,
    pub output: String,
    pub total_fetched: u64,
    pub rows_written: u64,
    pub rows_failed: u64,
    pub pages: u64,
    pub pauses: u32,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cursor: Option<String>,
    pub duration_secs: u64,
}

impl ReportOutput {
    /// Builds the output from a finished run.
    pub fn new(handle: &str, output: &Path, report: &PaginationReport) -> Self {
        let error = match &report.stop {
            StopReason::Exhausted => None,
            StopReason::FetchFailed(message) => Some(message.clone()),
        };

        Self {
            handle: handle.to_string(),
            output: output.display().to_string(),
            total_fetched: report.total_fetched,
            rows_written: report.rows_written,
            rows_failed: report.rows_failed,
            pages: report.pages,
            pauses: report.pauses,
            complete: report.is_complete(),
            error,
            last_cursor: (!report.last_cursor.is_end()).then(|| report.last_cursor.to_string()),
            duration_secs: report.duration.as_secs(),
        }
    }
}

/// A session cookie without its value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieOutput {
    pub name: String,
    pub domain: String,
    pub path: String,
    #[serde(serialize_with = "serialize_datetime_opt")]
    pub expires: Option<DateTime<Utc>>,
    pub expired: bool,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
}

impl From<&SessionCookie> for CookieOutput {
    fn from(cookie: &SessionCookie) -> Self {
        Self {
            name: cookie.name.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            expires: cookie.expires,
            expired: cookie.is_expired(),
            http_only: cookie.http_only,
            secure: cookie.secure,
            same_site: cookie.same_site.to_string(),
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a scrape report.
    pub fn format_report(&self, handle: &str, output: &Path, report: &PaginationReport) -> Result<String> {
        self.format(&ReportOutput::new(handle, output, report))
    }

    /// Formats session cookies, never including their values.
    pub fn format_cookies(&self, cookies: &[SessionCookie]) -> Result<String> {
        let outputs: Vec<CookieOutput> = cookies.iter().map(CookieOutput::from).collect();
        self.format(&outputs)
    }
}
