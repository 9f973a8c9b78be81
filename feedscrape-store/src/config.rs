//! Scrape configuration.
//!
//! Every field has a default, so an empty `{}` file or no file at all is a
//! valid configuration. Command-line flags are applied on top with
//! [`ScrapeConfig::apply`].

use feedscrape_core::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json_or_default, save_json};

/// Default session-cookie file.
pub const DEFAULT_SESSION_PATH: &str = "session.json";

/// Default CSV output file.
pub const DEFAULT_OUTPUT_PATH: &str = "posts.csv";

/// Default environment variable holding the account password.
pub const DEFAULT_PASSWORD_ENV: &str = "FEEDSCRAPE_PASSWORD";

/// Configuration of a scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Session-cookie file exported from a logged-in browser.
    pub session_path: PathBuf,
    /// Account whose posts are exported.
    pub handle: String,
    /// Account the session belongs to. Empty skips the ownership check.
    pub username: String,
    /// Environment variable the password is read from.
    pub password_env: String,
    /// CSV output file.
    pub output_path: PathBuf,
    /// Append to an existing output file instead of truncating it.
    pub append: bool,
    /// Posts requested per page.
    pub page_size: u32,
    /// Requests between governor pauses.
    pub request_threshold: u32,
    /// Length of a governor pause in seconds.
    pub pause_secs: u64,
    /// Base URL of the web API.
    pub api_base: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            handle: String::new(),
            username: String::new(),
            password_env: DEFAULT_PASSWORD_ENV.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            append: false,
            page_size: 20,
            request_threshold: 140,
            pause_secs: 900,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Values that override the configuration file.
///
/// `None` keeps the file's value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Overrides `handle`.
    pub handle: Option<String>,
    /// Overrides `username`.
    pub username: Option<String>,
    /// Overrides `session_path`.
    pub session_path: Option<PathBuf>,
    /// Overrides `output_path`.
    pub output_path: Option<PathBuf>,
    /// Forces `append` on when true.
    pub append: bool,
    /// Overrides `page_size`.
    pub page_size: Option<u32>,
    /// Overrides `request_threshold`.
    pub request_threshold: Option<u32>,
    /// Overrides `pause_secs`.
    pub pause_secs: Option<u64>,
}

impl ScrapeConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path; a missing file yields defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        let config: Self = load_json_or_default(path).await?;
        debug!(path = %path.display(), handle = %config.handle, "Configuration loaded");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Applies command-line overrides.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(handle) = overrides.handle {
            self.handle = handle;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(path) = overrides.session_path {
            self.session_path = path;
        }
        if let Some(path) = overrides.output_path {
            self.output_path = path;
        }
        if overrides.append {
            self.append = true;
        }
        if let Some(size) = overrides.page_size {
            self.page_size = size;
        }
        if let Some(threshold) = overrides.request_threshold {
            self.request_threshold = threshold;
        }
        if let Some(secs) = overrides.pause_secs {
            self.pause_secs = secs;
        }
    }

    /// Checks the values a run cannot start without.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.handle.trim_start_matches('@').trim().is_empty() {
            return Err(StoreError::Config("no handle to scrape".into()));
        }
        if self.page_size == 0 {
            return Err(StoreError::Config("page_size must be greater than 0".into()));
        }
        if self.request_threshold == 0 {
            return Err(StoreError::Config("request_threshold must be greater than 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(StoreError::Config("timeout_secs must be greater than 0".into()));
        }
        if self.api_base.is_empty() {
            return Err(StoreError::Config("api_base must not be empty".into()));
        }
        Ok(())
    }

    /// Handle without a leading `@`.
    pub fn handle(&self) -> &str {
        self.handle.trim_start_matches('@')
    }

    /// Governor pause length.
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the password from `password_env`, if set.
    pub fn password(&self) -> Option<String> {
        if self.password_env.is_empty() {
            return None;
        }
        std::env::var(&self.password_env).ok().filter(|p| !p.is_empty())
    }
}
