//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::api::ApiCommand;
use crate::commands::auth::AuthCommand;

/// Command-line client for the wayfare API.
#[derive(Parser, Debug)]
#[command(name = "wayfare")]
#[command(
    author,
    version = env!("WAYFARE_VERSION"),
    long_version = concat!(env!("WAYFARE_VERSION"), " (", env!("WAYFARE_TARGET"), ")"),
    about,
    long_about = None
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// API base URL
    #[arg(long, env = "WAYFARE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Session file (defaults to the user data directory)
    #[arg(long, env = "WAYFARE_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "WAYFARE_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in, sign out and manage the session
    Auth(AuthCommand),

    /// Send authenticated requests to the API
    Api(ApiCommand),
}
