//! JSON session file with an advisory lock.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use wayfare_core::error::StorageError;
use wayfare_core::{AccessToken, RefreshToken, Result, SessionUser, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk layout of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// A [`TokenStore`] backed by a single JSON file.
///
/// Writes take an exclusive lock on a sibling `.lock` file and replace the
/// session file atomically, so several processes (for example concurrent
/// CLI invocations) can share one session. On Unix the file is created
/// with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at the given file path. The file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(StorageError::from)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(StorageError::from)?;

        Ok(lock_file)
    }

    fn load_unlocked(&self) -> Result<StoredSession> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }

        let json = fs::read_to_string(&self.path).map_err(StorageError::from)?;
        if json.trim().is_empty() {
            return Ok(StoredSession::default());
        }

        let stored = serde_json::from_str(&json).map_err(StorageError::from)?;
        Ok(stored)
    }

    fn save_unlocked(&self, stored: &StoredSession) -> Result<()> {
        let json = serde_json::to_string_pretty(stored).map_err(StorageError::from)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json).map_err(StorageError::from)?;

        // Set restrictive permissions before the file becomes visible (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)
                .map_err(StorageError::from)?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(StorageError::from)?;
        }

        fs::rename(&temp_path, &self.path).map_err(StorageError::from)?;
        Ok(())
    }

    fn read(&self) -> Result<StoredSession> {
        let lock_file = self.open_lock()?;
        lock_file.lock_shared().map_err(StorageError::from)?;
        let stored = self.load_unlocked();
        lock_file.unlock().map_err(StorageError::from)?;
        stored
    }

    /// Read-modify-write under the exclusive lock.
    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut StoredSession),
    {
        let lock_file = self.open_lock()?;
        lock_file.lock_exclusive().map_err(StorageError::from)?;

        let result = self.load_unlocked().and_then(|mut stored| {
            apply(&mut stored);
            stored.updated_at = Some(Utc::now());
            self.save_unlocked(&stored)
        });

        lock_file.unlock().map_err(StorageError::from)?;
        result
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.read()?.access_token.map(AccessToken::new))
    }

    #[instrument(skip(self, token), fields(path = %self.path.display()))]
    async fn set_access_token(&self, token: &AccessToken) -> Result<()> {
        debug!("Persisting access token");
        self.update(|stored| stored.access_token = Some(token.as_str().to_string()))
    }

    async fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self.read()?.refresh_token.map(RefreshToken::new))
    }

    #[instrument(skip(self, token), fields(path = %self.path.display()))]
    async fn set_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        debug!("Persisting refresh token");
        self.update(|stored| stored.refresh_token = Some(token.as_str().to_string()))
    }

    async fn cached_user(&self) -> Result<Option<SessionUser>> {
        Ok(self.read()?.user)
    }

    async fn set_cached_user(&self, user: &SessionUser) -> Result<()> {
        self.update(|stored| stored.user = Some(user.clone()))
    }

    async fn clear_cached_user(&self) -> Result<()> {
        self.update(|stored| stored.user = None)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear_all(&self) -> Result<()> {
        debug!("Clearing stored tokens");
        self.update(|stored| {
            stored.access_token = None;
            stored.refresh_token = None;
        })
    }
}
