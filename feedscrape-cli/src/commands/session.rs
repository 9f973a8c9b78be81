//! Session command - inspect a session-cookie file without network access.

use anyhow::Result;
use clap::Args;
use feedscrape_fetch::timeline::DEFAULT_COOKIE_DOMAINS;
use feedscrape_fetch::Session;
use std::path::PathBuf;
use tracing::warn;

use super::load_config;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the session command.
#[derive(Args, Default)]
pub struct SessionArgs {
    /// Session-cookie file (defaults to the configured one).
    #[arg(long, short)]
    pub session: Option<PathBuf>,
}

/// Runs the session command.
pub async fn run(args: &SessionArgs, cli: &Cli) -> Result<()> {
    let path = match &args.session {
        Some(path) => path.clone(),
        None => load_config(cli).await?.session_path,
    };

    let session = Session::load(&path).await?;

    let scoped = session.for_domains(&DEFAULT_COOKIE_DOMAINS);
    if scoped.cookies().len() < session.cookies().len() {
        warn!(
            count = session.cookies().len() - scoped.cookies().len(),
            "Session holds cookies of other sites, they are never sent"
        );
    }
    if !scoped.has_auth_token() {
        warn!("Session has no valid auth_token cookie (missing or expired), login will fail");
    }
    if scoped.csrf_token().is_none() {
        warn!("Session has no ct0 cookie, requests will be rejected");
    }

    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_cookies(session.cookies()));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format_cookies(session.cookies())?);
        }
    }

    Ok(())
}
