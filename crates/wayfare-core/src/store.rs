//! In-memory token store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::traits::TokenStore;
use crate::types::SessionUser;
use crate::{AccessToken, RefreshToken, Result};

#[derive(Debug, Default)]
struct StoredState {
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    user: Option<SessionUser>,
}

/// A process-local [`TokenStore`].
///
/// Suitable for tests and for short-lived processes that log in on start.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: RwLock<StoredState>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_tokens(access_token: AccessToken, refresh_token: Option<RefreshToken>) -> Self {
        Self {
            state: RwLock::new(StoredState {
                access_token: Some(access_token),
                refresh_token,
                user: None,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoredState>> {
        self.state.read().map_err(|_| {
            StorageError::Unavailable {
                message: "token store lock poisoned".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoredState>> {
        self.state.write().map_err(|_| {
            StorageError::Unavailable {
                message: "token store lock poisoned".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.read()?.access_token.clone())
    }

    async fn set_access_token(&self, token: &AccessToken) -> Result<()> {
        self.write()?.access_token = Some(token.clone());
        Ok(())
    }

    async fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self.read()?.refresh_token.clone())
    }

    async fn set_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        self.write()?.refresh_token = Some(token.clone());
        Ok(())
    }

    async fn cached_user(&self) -> Result<Option<SessionUser>> {
        Ok(self.read()?.user.clone())
    }

    async fn set_cached_user(&self, user: &SessionUser) -> Result<()> {
        self.write()?.user = Some(user.clone());
        Ok(())
    }

    async fn clear_cached_user(&self) -> Result<()> {
        self.write()?.user = None;
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.write()?;
        state.access_token = None;
        state.refresh_token = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
        assert!(store.cached_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_all_keeps_cached_user() {
        let store = MemoryTokenStore::with_tokens(
            AccessToken::new("a1"),
            Some(RefreshToken::new("r1")),
        );
        let user = SessionUser {
            id: "u1".into(),
            email: "a@example.com".into(),
            role: None,
        };
        store.set_cached_user(&user).await.unwrap();

        store.clear_all().await.unwrap();

        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
        assert_eq!(store.cached_user().await.unwrap(), Some(user));

        store.clear_cached_user().await.unwrap();
        assert!(store.cached_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_replaces_tokens() {
        let store = MemoryTokenStore::new();
        store.set_access_token(&AccessToken::new("a1")).await.unwrap();
        store.set_access_token(&AccessToken::new("a2")).await.unwrap();
        store
            .set_refresh_token(&RefreshToken::new("r2"))
            .await
            .unwrap();

        assert_eq!(
            store.access_token().await.unwrap(),
            Some(AccessToken::new("a2"))
        );
        assert_eq!(
            store.refresh_token().await.unwrap(),
            Some(RefreshToken::new("r2"))
        );
    }
}
