//! Session subcommands.

mod login;
mod logout;
mod password;
mod refresh;
mod register;
mod revoke_all;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::ClientArgs;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Sign in with email and password
    Login(login::LoginArgs),

    /// Create an account and sign in
    Register(register::RegisterArgs),

    /// Sign out and clear the stored session
    Logout(logout::LogoutArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Refresh the access token now
    Refresh(refresh::RefreshArgs),

    /// Sign out every device
    RevokeAll(revoke_all::RevokeAllArgs),

    /// Request a password reset code
    ForgotPassword(password::ForgotPasswordArgs),

    /// Set a new password with a reset code
    ResetPassword(password::ResetPasswordArgs),
}

pub async fn handle(cmd: AuthCommand, client: &ClientArgs) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(args, client).await,
        AuthSubcommand::Register(args) => register::run(args, client).await,
        AuthSubcommand::Logout(args) => logout::run(args, client).await,
        AuthSubcommand::Whoami(args) => whoami::run(args, client).await,
        AuthSubcommand::Refresh(args) => refresh::run(args, client).await,
        AuthSubcommand::RevokeAll(args) => revoke_all::run(args, client).await,
        AuthSubcommand::ForgotPassword(args) => password::forgot(args, client).await,
        AuthSubcommand::ResetPassword(args) => password::reset(args, client).await,
    }
}
