//! Client configuration.

use std::time::Duration;

use wayfare_core::error::InvalidInputError;
use wayfare_core::{ApiUrl, Result};

use crate::endpoints;

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "WAYFARE_API_URL";

/// Environment variable holding the per-request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "WAYFARE_TIMEOUT_MS";

/// Configuration for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: ApiUrl,
    timeout: Duration,
    refresh_timeout: Option<Duration>,
    refresh_path: String,
    auth_endpoints: Vec<String>,
    refresh_on_forbidden: bool,
    user_agent: String,
}

impl ClientConfig {
    /// Per-request timeout used unless overridden.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create a configuration with defaults for the given backend.
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
            refresh_timeout: None,
            refresh_path: endpoints::REFRESH.to_string(),
            auth_endpoints: endpoints::AUTH_ENDPOINTS
                .iter()
                .map(|path| path.to_string())
                .collect(),
            refresh_on_forbidden: true,
            user_agent: concat!("wayfare/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Build a configuration from `WAYFARE_API_URL` and `WAYFARE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| InvalidInputError::Config {
                key: ENV_API_URL.to_string(),
                reason: "not set".to_string(),
            })?;
        let mut config = Self::new(ApiUrl::new(base_url.trim())?);

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| InvalidInputError::Config {
                key: ENV_TIMEOUT_MS.to_string(),
                reason: format!("'{}' is not a number of milliseconds", raw),
            })?;
            config = config.with_timeout(Duration::from_millis(millis));
        }

        Ok(config)
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout of the refresh call. Defaults to the request timeout.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Set the refresh endpoint path. The path is always treated as an auth endpoint.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Replace the list of auth endpoints that never carry a token and never
    /// trigger a refresh.
    pub fn with_auth_endpoints<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth_endpoints = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a 403 triggers a refresh like a 401 does.
    pub fn with_refresh_on_forbidden(mut self, enabled: bool) -> Self {
        self.refresh_on_forbidden = enabled;
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn base_url(&self) -> &ApiUrl {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout.unwrap_or(self.timeout)
    }

    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    pub fn refresh_on_forbidden(&self) -> bool {
        self.refresh_on_forbidden
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns true if `path` names an auth endpoint.
    ///
    /// Query strings and trailing slashes are ignored.
    pub fn is_auth_endpoint(&self, path: &str) -> bool {
        let path = normalize_path(path);
        path == normalize_path(&self.refresh_path)
            || self
                .auth_endpoints
                .iter()
                .any(|endpoint| normalize_path(endpoint) == path)
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> ClientConfig {
        ClientConfig::new(ApiUrl::new("https://api.example.com").unwrap())
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(15));
        assert_eq!(config.refresh_path(), "/auth/refresh");
        assert!(config.refresh_on_forbidden());
        assert!(config.user_agent().starts_with("wayfare/"));
    }

    #[test]
    fn auth_endpoints_are_exempt() {
        let config = config();
        for path in [
            "/auth/login",
            "/auth/register",
            "/auth/refresh",
            "/auth/social",
            "/auth/forgot-password",
            "/auth/reset-password",
        ] {
            assert!(config.is_auth_endpoint(path), "{path}");
        }
    }

    #[test]
    fn session_endpoints_are_not_exempt() {
        let config = config();
        assert!(!config.is_auth_endpoint("/auth/logout"));
        assert!(!config.is_auth_endpoint("/auth/revoke-all"));
        assert!(!config.is_auth_endpoint("/places"));
        assert!(!config.is_auth_endpoint("/auth/login/history"));
    }

    #[test]
    fn matching_ignores_query_and_trailing_slash() {
        let config = config();
        assert!(config.is_auth_endpoint("auth/login/"));
        assert!(config.is_auth_endpoint("/auth/login?next=/home"));
    }

    #[test]
    fn custom_refresh_path_is_exempt() {
        let config = config()
            .with_auth_endpoints(["/session/new"])
            .with_refresh_path("/session/renew");
        assert!(config.is_auth_endpoint("/session/renew"));
        assert!(config.is_auth_endpoint("/session/new"));
        assert!(!config.is_auth_endpoint("/auth/login"));
    }

    #[test]
    fn refresh_timeout_override() {
        let config = config()
            .with_timeout(Duration::from_secs(5))
            .with_refresh_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.refresh_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn from_lookup_reads_url_and_timeout() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "http://10.0.2.2:4000/api"),
            (ENV_TIMEOUT_MS, "2500"),
        ]);
        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url().endpoint("/places"), "http://10.0.2.2:4000/api/places");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn from_lookup_requires_url() {
        assert!(ClientConfig::from_lookup(|_| None).is_err());
        assert!(ClientConfig::from_lookup(|_| Some("  ".to_string())).is_err());
    }

    #[test]
    fn from_lookup_rejects_bad_timeout() {
        let result = ClientConfig::from_lookup(|key| match key {
            ENV_API_URL => Some("https://api.example.com".to_string()),
            _ => Some("soon".to_string()),
        });
        assert!(result.is_err());
    }
}
