//! Authenticated API client.

use std::fmt;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, trace, warn};

use wayfare_core::error::{ApiError, AuthError, Error};
use wayfare_core::{AccessToken, Result, SessionEndNotifier, TokenStore};

use crate::config::ClientConfig;
use crate::refresh::RefreshCoordinator;
use crate::request::{
    ApiRequest, ApiResponse, bearer_value, default_headers, read_response, transport_error,
};

/// HTTP client for the wayfare API.
///
/// Cheap to clone (internal `Arc`); construct one per process and share it.
/// All requests go through the same token store, refresh coordinator and
/// session-end slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    coordinator: RefreshCoordinator,
    session_end: SessionEndNotifier,
}

impl ApiClient {
    /// Create a client for the configured backend using the given token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .default_headers(default_headers())
            .build()
            .map_err(transport_error)?;

        let session_end = SessionEndNotifier::new();
        let coordinator = RefreshCoordinator::new(
            http.clone(),
            config.base_url().endpoint(config.refresh_path()),
            config.refresh_timeout(),
            Arc::clone(&store),
            session_end.clone(),
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                store,
                coordinator,
                session_end,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Token writes stay inside this crate: the refresh coordinator and the
    /// auth operations own them. Callers read through
    /// [`is_authenticated`](Self::is_authenticated) and
    /// [`current_user`](Self::current_user).
    pub(crate) fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Register the callback run when a failed refresh ends the session.
    ///
    /// There is one slot; a later registration replaces an earlier one.
    pub fn on_session_end<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.session_end.register(callback);
    }

    /// Returns the session-end slot shared by this client.
    pub fn session_end(&self) -> &SessionEndNotifier {
        &self.inner.session_end
    }

    /// Send a request, refreshing the access token and replaying the request
    /// once if the backend rejects the token.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] for non-2xx responses, including the original 401/403
    ///   when the refresh fails
    /// - [`AuthError::ReplayExhausted`] when the replayed request is rejected again
    /// - [`Error::Transport`] when the backend cannot be reached
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let rejected = match self.dispatch(&request, None).await {
            Err(Error::Api(err)) if self.should_refresh(&request, &err) => err,
            other => return other,
        };

        request.mark_retry();
        info!(status = rejected.status, "Access token rejected, refreshing");

        match self.inner.coordinator.refresh().await {
            Ok(token) => self.replay(&request, &token).await,
            Err(err) => {
                debug!(error = %err, "Refresh failed, returning original error");
                Err(Error::Api(rejected))
            }
        }
    }

    /// Force a token refresh, joining one already in flight.
    ///
    /// On failure the session is ended exactly as for an automatic refresh.
    #[instrument(skip(self))]
    pub async fn refresh_session(&self) -> Result<AccessToken> {
        self.inner
            .coordinator
            .refresh()
            .await
            .map_err(|err| AuthError::Refresh(err).into())
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    /// PUT a JSON body to `path` and decode the JSON response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await?.json()
    }

    /// PATCH a JSON body to `path` and decode the JSON response.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::patch(path).json(body)?).await?.json()
    }

    /// DELETE `path` and decode the JSON response (`()` for empty bodies).
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::delete(path)).await?.json()
    }

    fn should_refresh(&self, request: &ApiRequest, err: &ApiError) -> bool {
        let config = &self.inner.config;
        !request.is_retry()
            && err.is_auth_failure(config.refresh_on_forbidden())
            && !config.is_auth_endpoint(request.path())
    }

    /// Re-issue a request once with the refreshed token.
    async fn replay(&self, request: &ApiRequest, token: &AccessToken) -> Result<ApiResponse> {
        debug!("Replaying request with refreshed token");

        match self.dispatch(request, Some(token)).await {
            Err(Error::Api(err))
                if err.is_auth_failure(self.inner.config.refresh_on_forbidden()) =>
            {
                warn!(status = err.status, "Request rejected again after refresh");
                Err(AuthError::ReplayExhausted(err).into())
            }
            other => other,
        }
    }

    /// Decorate and send one request. No refresh handling happens here.
    pub(crate) async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse> {
        let config = &self.inner.config;
        let url = config.base_url().endpoint(request.path());
        let exempt = config.is_auth_endpoint(request.path());

        // The bearer comes from the store on every call, or from the replay
        // token. No token is cached between requests.
        let mut headers = request.headers().clone();

        if !exempt {
            let token = match token {
                Some(token) => Some(token.clone()),
                None => self.current_access_token().await,
            };
            if let Some(token) = token {
                headers.insert(AUTHORIZATION, bearer_value(&token)?);
            }
        }

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), &url)
            .headers(headers)
            .timeout(request.timeout_override().unwrap_or(config.timeout()));

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method(),
            path = request.path(),
            retry = request.is_retry(),
            "API request"
        );

        let response = builder.send().await.map_err(transport_error)?;
        let result = read_response(response).await;

        match &result {
            Ok(response) => trace!(status = %response.status(), "API response"),
            Err(err) => debug!(error = %err, "API request failed"),
        }

        result
    }

    /// Read the access token for decoration. Failures mean "no token".
    async fn current_access_token(&self) -> Option<AccessToken> {
        match self.inner.store.access_token().await {
            Ok(token) => {
                if token.is_none() {
                    debug!("No access token stored, sending request without one");
                }
                token
            }
            Err(err) => {
                warn!(error = %err, "Failed to read access token, sending request without one");
                None
            }
        }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url().as_str())
            .field("coordinator", &self.inner.coordinator)
            .field("session_end", &self.inner.session_end)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::{ApiUrl, MemoryTokenStore};

    fn client() -> ApiClient {
        let config = ClientConfig::new(ApiUrl::new("https://api.example.com").unwrap());
        ApiClient::new(config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn retried_requests_never_refresh() {
        let client = client();
        let mut request = ApiRequest::get("/places");
        let err = ApiError::new(401, None, None);
        assert!(client.should_refresh(&request, &err));

        request.mark_retry();
        assert!(!client.should_refresh(&request, &err));
    }

    #[test]
    fn auth_endpoints_never_refresh() {
        let client = client();
        let err = ApiError::new(401, None, None);
        assert!(!client.should_refresh(&ApiRequest::post("/auth/login"), &err));
        assert!(!client.should_refresh(&ApiRequest::post("/auth/refresh"), &err));
    }

    #[test]
    fn only_auth_statuses_refresh() {
        let client = client();
        let request = ApiRequest::get("/events");
        assert!(client.should_refresh(&request, &ApiError::new(403, None, None)));
        assert!(!client.should_refresh(&request, &ApiError::new(404, None, None)));
        assert!(!client.should_refresh(&request, &ApiError::new(500, None, None)));
    }

    #[test]
    fn debug_does_not_leak_tokens() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("api.example.com"));
        assert!(!debug.contains("Bearer"));
    }
}
