//! Text output formatting with colors.

use chrono::{DateTime, Local, Utc};
use feedscrape_core::SessionCookie;
use feedscrape_fetch::{PaginationReport, StopReason};
use feedscrape_store::ScrapeConfig;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the result of a scrape run.
    pub fn format_report(&self, handle: &str, output: &Path, report: &PaginationReport) -> String {
        let mut lines = Vec::new();

        let status = match &report.stop {
            StopReason::Exhausted => self.green("complete"),
            StopReason::FetchFailed(_) => self.yellow("stopped early"),
        };
        lines.push(format!("{} @{} ({})", self.bold("Scrape"), handle, status));

        lines.push(format!(
            "Total posts fetched: {}",
            self.bold(&report.total_fetched.to_string())
        ));
        lines.push(format!("Written to:          {}", output.display()));
        lines.push(format!(
            "Pages:               {} ({} pauses, {})",
            report.pages,
            report.pauses,
            format_duration(report.duration)
        ));

        if report.rows_failed > 0 {
            lines.push(self.yellow(&format!("Rows skipped:        {}", report.rows_failed)));
        }

        if let StopReason::FetchFailed(message) = &report.stop {
            lines.push(self.red(&format!("Error: {message}")));
            if !report.last_cursor.is_end() {
                lines.push(self.dim(&format!("Last cursor: {}", report.last_cursor)));
            }
        }

        lines.join("\n")
    }

    /// Formats session cookies, one per line. Values are never shown.
    pub fn format_cookies(&self, cookies: &[SessionCookie]) -> String {
        if cookies.is_empty() {
            return self.yellow("Session file contains no cookies");
        }

        let now = Utc::now();
        let name_width = cookies.iter().map(|c| c.name.len()).max().unwrap_or(0);

        let mut lines = vec![self.bold(&format!("{} cookies", cookies.len()))];
        for cookie in cookies {
            let expiry = match cookie.expires {
                None => self.dim("session"),
                Some(at) if cookie.is_expired_at(now) => self.red(&format!("expired {}", format_time(at))),
                Some(at) => format!("expires {}", format_time(at)),
            };
            lines.push(format!(
                "  {:<width$}  {:<12} {}",
                cookie.name,
                cookie.domain,
                expiry,
                width = name_width
            ));
        }

        lines.join("\n")
    }

    /// Formats the effective configuration.
    pub fn format_config(&self, config: &ScrapeConfig) -> String {
        let handle = if config.handle.is_empty() {
            self.dim("(not set)")
        } else {
            format!("@{}", config.handle())
        };

        [
            self.bold("feedscrape configuration"),
            "─".repeat(40),
            format!("Handle:            {handle}"),
            format!("Session file:      {}", config.session_path.display()),
            format!("Output file:       {}", config.output_path.display()),
            format!("Append:            {}", config.append),
            format!("Page size:         {}", config.page_size),
            format!("Request threshold: {}", config.request_threshold),
            format!("Pause:             {}", format_duration(config.pause())),
            format!("API base:          {}", config.api_base),
            format!("Timeout:           {}", format_duration(config.timeout())),
        ]
        .join("\n")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

/// Formats a duration as `1h 2m`, `3m 4s` or `5s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
