// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! feedscrape CLI - export an account's posts to CSV.
//!
//! # Examples
//!
//! ```bash
//! # Scrape the configured account
//! feedscrape
//!
//! # Scrape a specific account into a specific file
//! feedscrape scrape --handle someone --output someone.csv
//!
//! # Continue an earlier export
//! feedscrape scrape --handle someone --output someone.csv --append
//!
//! # Check a session file
//! feedscrape session --session cookies.json
//!
//! # Write a config file
//! feedscrape config init --handle someone
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use feedscrape_fetch::{FetchError, SessionError};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, scrape, session};

// ============================================================================
// CLI Definition
// ============================================================================

/// feedscrape CLI - export an account's posts to CSV.
#[derive(Parser)]
#[command(name = "feedscrape")]
#[command(about = "Export an account's posts to CSV using a stored browser session")]
#[command(long_about = r#"
feedscrape logs in with session cookies exported from a browser, pages
through an account's timeline and writes every post to a CSV file.

After a fixed number of requests it pauses (140 requests, 15 minutes by
default) to stay below the platform's rate limits.

Examples:
  feedscrape                                  # Scrape the configured account
  feedscrape scrape --handle someone          # Scrape a specific account
  feedscrape session                          # Inspect the session file
  feedscrape config init --handle someone     # Write a config file
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'scrape' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to the platform config dir).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Export posts to CSV (default if no command specified).
    #[command(visible_alias = "s")]
    Scrape(scrape::ScrapeArgs),

    /// List the cookies of a session file.
    Session(session::SessionArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success, including runs that stopped early on a page error.
    Success = 0,
    /// General error.
    Error = 1,
    /// The session file could not be read or decoded.
    Session = 2,
    /// The platform rejected the session.
    Auth = 3,
}

impl ExitCode {
    /// Maps an error to the exit code it should produce.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<SessionError>().is_some() {
            return Self::Session;
        }
        match err.downcast_ref::<FetchError>() {
            Some(FetchError::Session(_)) => Self::Session,
            Some(e) if e.is_auth_error() => Self::Auth,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("feedscrape=debug,warn")
    } else {
        EnvFilter::new("feedscrape=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Scrape(args)) => scrape::run(args, &cli).await,
        Some(Commands::Session(args)) => session::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => {
            // Default to scrape command
            scrape::run(&scrape::ScrapeArgs::default(), &cli).await
        }
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use feedscrape_core::CoreError;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["feedscrape", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn test_scrape_flags() {
        let cli = Cli::try_parse_from([
            "feedscrape",
            "scrape",
            "--handle",
            "someone",
            "--append",
            "--threshold",
            "10",
            "--config",
            "/tmp/c.json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Some(Commands::Scrape(args)) => {
                assert_eq!(args.handle.as_deref(), Some("someone"));
                assert!(args.append);
                assert_eq!(args.threshold, Some(10));
                assert_eq!(args.page_size, None);
            }
            _ => panic!("expected scrape command"),
        }
    }

    #[test]
    fn test_exit_codes() {
        let session = anyhow::Error::from(SessionError::InvalidCookie(CoreError::InvalidData("x".into())));
        assert_eq!(ExitCode::for_error(&session), ExitCode::Session);

        let auth = anyhow::Error::from(FetchError::AuthenticationFailed("rejected".into()));
        assert_eq!(ExitCode::for_error(&auth), ExitCode::Auth);

        let other = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::for_error(&other), ExitCode::Error);

        let wrapped = anyhow::Error::from(FetchError::AuthenticationFailed("rejected".into()))
            .context("while logging in");
        assert_eq!(ExitCode::for_error(&wrapped), ExitCode::Auth);
    }
}
