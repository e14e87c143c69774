//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use wayfare_core::Credentials;

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "WAYFARE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, client_args: &ClientArgs) -> Result<()> {
    let client = session::connect(client_args)?;
    let credentials = Credentials::new(&args.email, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let auth = client
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    if let Some(user) = &auth.user {
        output::user(user);
    }
    output::field("API", client.config().base_url().as_str());

    Ok(())
}
