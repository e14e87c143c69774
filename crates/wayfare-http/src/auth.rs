//! Session-establishing operations: login, registration, logout and
//! password reset.
//!
//! These calls go to auth endpoints, which never carry a bearer token and
//! never trigger a refresh. Logout and revoke-all are the exceptions: they
//! act on the current session and are sent with its token.

use tracing::{debug, info, instrument, warn};

use wayfare_core::error::{AuthError, Error};
use wayfare_core::{AccessToken, Credentials, RefreshToken, Registration, Result, SessionUser};

use crate::client::ApiClient;
use crate::endpoints::{
    self, AuthResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, MessageResponse,
    RegisterRequest, ResetPasswordRequest, SocialLoginRequest,
};
use crate::request::ApiRequest;

/// A session established by login, registration or social login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: Option<SessionUser>,
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
}

impl ApiClient {
    /// Log in with email and password and persist the resulting session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the backend answers 401,
    /// or a storage error if the session cannot be persisted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession> {
        info!("Logging in");

        let request = ApiRequest::post(endpoints::LOGIN).json(&LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        })?;

        let response = self.send(request).await.map_err(credential_error)?;
        self.establish(response.json()?).await
    }

    /// Create an account and persist the resulting session.
    #[instrument(skip(self, registration), fields(email = %registration.credentials().email()))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession> {
        info!("Registering account");

        let credentials = registration.credentials();
        let request = ApiRequest::post(endpoints::REGISTER).json(&RegisterRequest {
            email: credentials.email(),
            password: credentials.password(),
            name: registration.name(),
            role: registration.role(),
        })?;

        let response = self.send(request).await?;
        self.establish(response.json()?).await
    }

    /// Exchange an identity provider token for a session.
    #[instrument(skip(self, token))]
    pub async fn social_login(
        &self,
        provider: &str,
        token: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<AuthSession> {
        info!("Logging in with identity provider");

        let request = ApiRequest::post(endpoints::SOCIAL_LOGIN).json(&SocialLoginRequest {
            provider,
            token,
            email,
            name,
        })?;

        let response = self.send(request).await.map_err(credential_error)?;
        self.establish(response.json()?).await
    }

    /// Log out: tell the backend (best effort) and clear local session state.
    ///
    /// This is a user action; the session-end callback does not run.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");

        let refresh_token = match self.store().refresh_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "Failed to read refresh token for logout");
                None
            }
        };

        let request = ApiRequest::post(endpoints::LOGOUT).json(&LogoutRequest {
            refresh_token: refresh_token.as_ref().map(RefreshToken::as_str),
        })?;

        // No refresh on rejection: an expired session is being discarded anyway.
        if let Err(err) = self.dispatch(&request, None).await {
            warn!(error = %err, "Logout request failed, clearing local session anyway");
        }

        self.clear_local_session().await
    }

    /// Revoke every session of the current user, then clear local state.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLoggedIn`] if no access token is stored.
    #[instrument(skip(self))]
    pub async fn revoke_all_sessions(&self) -> Result<()> {
        if !self.is_authenticated().await {
            return Err(AuthError::NotLoggedIn.into());
        }

        info!("Revoking all sessions");
        self.send(ApiRequest::post(endpoints::REVOKE_ALL)).await?;
        self.clear_local_session().await
    }

    /// Ask the backend to send a password reset code.
    ///
    /// Returns the backend's message, if any.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>> {
        let request =
            ApiRequest::post(endpoints::FORGOT_PASSWORD).json(&ForgotPasswordRequest { email })?;
        let response: Option<MessageResponse> = self.send(request).await?.json()?;
        Ok(response.and_then(|r| r.message))
    }

    /// Set a new password using an emailed reset code.
    #[instrument(skip(self, code, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<Option<String>> {
        let request = ApiRequest::post(endpoints::RESET_PASSWORD).json(&ResetPasswordRequest {
            email,
            code,
            new_password,
        })?;
        let response: Option<MessageResponse> = self.send(request).await?.json()?;
        Ok(response.and_then(|r| r.message))
    }

    /// True if an access token is stored. Storage failures count as signed out.
    pub async fn is_authenticated(&self) -> bool {
        match self.store().access_token().await {
            Ok(token) => token.is_some(),
            Err(err) => {
                warn!(error = %err, "Failed to read access token");
                false
            }
        }
    }

    /// The cached profile of the signed-in user.
    pub async fn current_user(&self) -> Result<Option<SessionUser>> {
        self.store().cached_user().await
    }

    async fn establish(&self, response: AuthResponse) -> Result<AuthSession> {
        let access_token = AccessToken::new(response.access_token);
        let refresh_token = response.refresh_token.map(RefreshToken::new);
        let store = self.store();

        store.set_access_token(&access_token).await?;
        match &refresh_token {
            Some(token) => store.set_refresh_token(token).await?,
            None => debug!("Auth response carried no refresh token"),
        }
        match &response.user {
            Some(user) => store.set_cached_user(user).await?,
            None => store.clear_cached_user().await?,
        }

        debug!(
            user = response.user.as_ref().map(|u| u.email.as_str()),
            "Session established"
        );

        Ok(AuthSession {
            user: response.user,
            access_token,
            refresh_token,
        })
    }

    async fn clear_local_session(&self) -> Result<()> {
        self.store().clear_all().await?;
        self.store().clear_cached_user().await?;
        debug!("Local session cleared");
        Ok(())
    }
}

/// A 401 from a login endpoint means the credentials were wrong.
fn credential_error(err: Error) -> Error {
    match err {
        Error::Api(api) if api.status == 401 => AuthError::InvalidCredentials.into(),
        other => other,
    }
}
