//! Password reset commands.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::ClientArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct ForgotPasswordArgs {
    /// Account email
    #[arg(long)]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct ResetPasswordArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Code from the reset email
    #[arg(long)]
    pub code: String,

    /// New password
    #[arg(long, env = "WAYFARE_NEW_PASSWORD", hide_env_values = true)]
    pub new_password: String,
}

pub async fn forgot(args: ForgotPasswordArgs, client_args: &ClientArgs) -> Result<()> {
    let client = session::connect(client_args)?;

    let message = client
        .forgot_password(&args.email)
        .await
        .context("Failed to request reset code")?;

    output::success(message.as_deref().unwrap_or("Reset code requested"));
    Ok(())
}

pub async fn reset(args: ResetPasswordArgs, client_args: &ClientArgs) -> Result<()> {
    let client = session::connect(client_args)?;

    let message = client
        .reset_password(&args.email, &args.code, &args.new_password)
        .await
        .context("Failed to reset password")?;

    output::success(message.as_deref().unwrap_or("Password reset"));
    Ok(())
}
