//! CLI command implementations.

pub mod config;
pub mod scrape;
pub mod session;

use anyhow::{Context, Result};
use feedscrape_store::ScrapeConfig;
use tracing::debug;

use crate::Cli;

/// Loads the configuration file named by `--config`, or the default one.
pub async fn load_config(cli: &Cli) -> Result<ScrapeConfig> {
    let path = cli.config.clone().unwrap_or_else(ScrapeConfig::default_path);
    debug!(path = %path.display(), "Loading configuration");

    ScrapeConfig::load_from(&path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}
