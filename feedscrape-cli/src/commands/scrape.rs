//! Scrape command - export an account's posts to CSV.

use anyhow::{Context, Result};
use clap::Args;
use feedscrape_core::RecordSink;
use feedscrape_fetch::{
    Credentials, Paginator, PostSource, RateLimitPolicy, Session, StopReason, TimelineClient,
    TimelineClientConfig,
};
use feedscrape_store::{ConfigOverrides, CsvRecordWriter, ScrapeConfig};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::load_config;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the scrape command.
#[derive(Args, Default)]
pub struct ScrapeArgs {
    /// Account whose posts are exported.
    #[arg(long)]
    pub handle: Option<String>,

    /// Account the session belongs to.
    #[arg(long, short)]
    pub username: Option<String>,

    /// Session-cookie file.
    #[arg(long, short)]
    pub session: Option<PathBuf>,

    /// CSV output file.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Append to the output file instead of overwriting it.
    #[arg(long, short)]
    pub append: bool,

    /// Posts requested per page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Requests between pauses.
    #[arg(long)]
    pub threshold: Option<u32>,

    /// Pause length in seconds.
    #[arg(long)]
    pub pause_secs: Option<u64>,
}

impl ScrapeArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            handle: self.handle.clone(),
            username: self.username.clone(),
            session_path: self.session.clone(),
            output_path: self.output.clone(),
            append: self.append,
            page_size: self.page_size,
            request_threshold: self.threshold,
            pause_secs: self.pause_secs,
        }
    }
}

/// Runs the scrape command.
pub async fn run(args: &ScrapeArgs, cli: &Cli) -> Result<()> {
    let mut config = load_config(cli).await?;
    config.apply(args.overrides());
    config.validate()?;

    info!(handle = %config.handle(), output = %config.output_path.display(), "Starting scrape");

    let client = connect(&config).await?;

    // Only created once login succeeded, so a rejected session leaves no file behind.
    let mut writer = CsvRecordWriter::create(&config.output_path, config.append)
        .with_context(|| format!("Failed to open {}", config.output_path.display()))?;

    let report = Paginator::new(&client)
        .with_page_size(config.page_size)
        .with_policy(RateLimitPolicy::new(config.request_threshold, config.pause()))
        .run(config.handle(), &mut writer)
        .await;

    writer.flush()?;
    debug!(rows = writer.rows_written(), "Output closed");

    if let StopReason::FetchFailed(message) = &report.stop {
        warn!(error = %message, "Scrape stopped before the end of the timeline");
    }

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_report(config.handle(), &config.output_path, &report));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_report(config.handle(), &config.output_path, &report)?);
        }
    }

    Ok(())
}

/// Loads the session, builds the client and logs in.
async fn connect(config: &ScrapeConfig) -> Result<TimelineClient> {
    let session = Session::load(&config.session_path).await?;

    let client_config = TimelineClientConfig {
        api_base: config.api_base.clone(),
        timeout: config.timeout(),
        ..TimelineClientConfig::default()
    };
    let client = TimelineClient::new(client_config, &session)?;

    let credentials = Credentials::new(config.username.clone(), config.password());
    client.login(&credentials).await?;

    Ok(client)
}
