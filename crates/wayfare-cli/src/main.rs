//! wayfare - command-line client for the wayfare API.
//!
//! A thin wrapper over `wayfare-http`. The session is kept in a token file
//! so consecutive invocations share one login, and expired access tokens
//! are refreshed transparently.
//!
//! Exit status is 0 on success, 3 when the user has to sign in again
//! (bad credentials, no session, or a session that could not be refreshed)
//! and 1 for everything else.

mod cli;
mod commands;
mod output;
mod session;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use wayfare_core::error::{AuthError, Error, RefreshError};

use cli::{Cli, Commands};
use commands::{api, auth};

const EXIT_SIGN_IN_REQUIRED: u8 = 3;

/// Crates whose logs `-v` turns up. Dependencies stay at `warn`.
const LOG_TARGETS: &[&str] = &["wayfare", "wayfare_core", "wayfare_file", "wayfare_http"];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let result = match cli.command {
        Commands::Auth(cmd) => auth::handle(cmd, &cli.client).await,
        Commands::Api(cmd) => api::handle(cmd, &cli.client).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{:#}", err));
            if needs_sign_in(&err) {
                ExitCode::from(EXIT_SIGN_IN_REQUIRED)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn default_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    LOG_TARGETS
        .iter()
        .fold("warn".to_string(), |filter, target| {
            format!("{filter},{target}={level}")
        })
}

/// True if the failure means the stored session is gone or was refused.
fn needs_sign_in(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<Error>())
        .any(|err| match err {
            Error::Auth(AuthError::Refresh(RefreshError::Transport { .. })) => false,
            Error::Auth(_) => true,
            Error::Api(api) => api.is_auth_failure(true),
            _ => false,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use wayfare_core::error::ApiError;

    #[test]
    fn verbosity_only_raises_wayfare_targets() {
        assert_eq!(
            default_filter(0),
            "warn,wayfare=warn,wayfare_core=warn,wayfare_file=warn,wayfare_http=warn"
        );
        let debug = default_filter(2);
        assert!(debug.starts_with("warn,"));
        assert!(debug.contains("wayfare_http=debug"));
    }

    #[test]
    fn rejected_session_needs_sign_in() {
        let err = Err::<(), _>(Error::Api(ApiError::new(401, None, None)))
            .context("Request failed")
            .unwrap_err();
        assert!(needs_sign_in(&err));

        let err = Err::<(), _>(Error::from(AuthError::NotLoggedIn))
            .context("No active session")
            .unwrap_err();
        assert!(needs_sign_in(&err));
    }

    #[test]
    fn other_failures_do_not_need_sign_in() {
        let err = Err::<(), _>(Error::Api(ApiError::new(500, None, None)))
            .context("Request failed")
            .unwrap_err();
        assert!(!needs_sign_in(&err));

        let offline = Error::from(AuthError::Refresh(RefreshError::Transport {
            message: "connection refused".to_string(),
        }));
        assert!(!needs_sign_in(&anyhow::Error::new(offline)));
        assert!(!needs_sign_in(&anyhow::anyhow!("bad flag")));
    }
}
