//! Token store trait.

use async_trait::async_trait;

use crate::types::SessionUser;
use crate::{AccessToken, RefreshToken, Result};

/// Persistent storage for the session's tokens and cached user.
///
/// Every operation may fail (keychain locked, disk full, ...). Callers in
/// the request path treat failed reads as "absent" and failed writes as
/// best-effort.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored access token, if any.
    async fn access_token(&self) -> Result<Option<AccessToken>>;

    /// Replace the stored access token.
    async fn set_access_token(&self, token: &AccessToken) -> Result<()>;

    /// Returns the stored refresh token, if any.
    async fn refresh_token(&self) -> Result<Option<RefreshToken>>;

    /// Replace the stored refresh token.
    async fn set_refresh_token(&self, token: &RefreshToken) -> Result<()>;

    /// Returns the cached user profile, if any.
    async fn cached_user(&self) -> Result<Option<SessionUser>>;

    /// Replace the cached user profile.
    async fn set_cached_user(&self, user: &SessionUser) -> Result<()>;

    /// Remove the cached user profile.
    async fn clear_cached_user(&self) -> Result<()>;

    /// Remove both tokens.
    async fn clear_all(&self) -> Result<()>;
}
