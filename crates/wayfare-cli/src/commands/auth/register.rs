//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use wayfare_core::{Credentials, Registration};

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "WAYFARE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Account role (for example TOURIST or GUIDE)
    #[arg(long)]
    pub role: Option<String>,
}

pub async fn run(args: RegisterArgs, client_args: &ClientArgs) -> Result<()> {
    let client = session::connect(client_args)?;

    let mut registration = Registration::new(Credentials::new(&args.email, &args.password));
    if let Some(name) = args.name {
        registration = registration.with_name(name);
    }
    if let Some(role) = args.role {
        registration = registration.with_role(role);
    }

    eprintln!("{}", "Creating account...".dimmed());

    let auth = client
        .register(&registration)
        .await
        .context("Failed to register")?;

    output::success("Account created");
    if let Some(user) = &auth.user {
        output::user(user);
    }

    Ok(())
}
