//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, client_args: &ClientArgs) -> Result<()> {
    let client = session::connect(client_args)?;

    eprintln!("{}", "Refreshing session...".dimmed());

    client
        .refresh_session()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    Ok(())
}
