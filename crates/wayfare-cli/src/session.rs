//! Client construction and session file location.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use wayfare_core::ApiUrl;
use wayfare_file::FileTokenStore;
use wayfare_http::{ApiClient, ClientConfig};

use crate::cli::ClientArgs;
use crate::output;

/// Resolve the session file path, defaulting to `<data dir>/wayfare/session.json`.
pub fn token_path(args: &ClientArgs) -> Result<PathBuf> {
    if let Some(path) = &args.token_file {
        return Ok(path.clone());
    }

    let dirs =
        ProjectDirs::from("", "", "wayfare").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("session.json"))
}

/// Open the token file without contacting the API.
pub fn open_store(args: &ClientArgs) -> Result<FileTokenStore> {
    Ok(FileTokenStore::new(token_path(args)?))
}

/// Build an API client backed by the session file.
///
/// When a failed refresh ends the session, a notice is printed to stderr.
pub fn connect(args: &ClientArgs) -> Result<ApiClient> {
    let api_url = args
        .api_url
        .as_deref()
        .context("No API URL. Pass --api-url or set WAYFARE_API_URL.")?;
    let api_url = ApiUrl::new(api_url).context("Invalid API URL")?;

    let mut config = ClientConfig::new(api_url);
    if let Some(millis) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(millis));
    }

    let store = Arc::new(open_store(args)?);
    tracing::debug!(path = %store.path().display(), "Using session file");

    let client = ApiClient::new(config, store).context("Failed to create API client")?;
    client.on_session_end(output::session_expired);

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(token_file: Option<&str>) -> ClientArgs {
        ClientArgs {
            api_url: Some("https://api.example.com".to_string()),
            token_file: token_file.map(PathBuf::from),
            timeout_ms: None,
        }
    }

    #[test]
    fn explicit_token_file_wins() {
        let path = token_path(&args(Some("/tmp/wayfare-test.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/wayfare-test.json"));
    }

    #[test]
    fn missing_api_url_is_reported() {
        let mut args = args(Some("/tmp/wayfare-test.json"));
        args.api_url = None;
        let err = connect(&args).unwrap_err();
        assert!(err.to_string().contains("WAYFARE_API_URL"));
    }
}
