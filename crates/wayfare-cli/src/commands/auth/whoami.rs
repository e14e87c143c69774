//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use wayfare_core::TokenStore;
use wayfare_core::error::{AuthError, Error};

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the cached user as JSON
    #[arg(long)]
    pub json: bool,
}

/// Reads the session file only; the API is not contacted.
pub async fn run(args: WhoamiArgs, client_args: &ClientArgs) -> Result<()> {
    let store = session::open_store(client_args)?;

    let signed_in = store
        .access_token()
        .await
        .context("Failed to read session")?
        .is_some();
    let user = store
        .cached_user()
        .await
        .context("Failed to read session")?
        .filter(|_| signed_in)
        .ok_or_else(|| Error::from(AuthError::NotLoggedIn))
        .context("No active session. Run 'wayfare auth login' first.")?;

    if args.json {
        return output::json(&user);
    }

    output::user(&user);
    output::field("Session file", &store.path().display().to_string());

    Ok(())
}
