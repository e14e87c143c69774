//! Revoke-all command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RevokeAllArgs {}

pub async fn run(_args: RevokeAllArgs, client_args: &ClientArgs) -> Result<()> {
    let client = session::connect(client_args)?;

    client
        .revoke_all_sessions()
        .await
        .context("Failed to revoke sessions")?;

    output::success("All sessions revoked");
    Ok(())
}
