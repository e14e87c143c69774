//! Single-flight access token refresh.
//!
//! At most one refresh call is in flight per client. The in-flight call is
//! held as a shared future in one slot: the first caller to find the slot
//! empty starts the refresh, later callers clone the shared future and await
//! the same outcome. The refresh runs on its own task, so it completes even
//! if every waiter is dropped, and it empties the slot before any waiter
//! observes the outcome.
//!
//! A failed refresh ends the session exactly once: tokens and the cached
//! user are cleared and the session-end callback runs, no matter how many
//! callers were waiting.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::header::ACCEPT;
use tracing::{debug, info, instrument, warn};

use wayfare_core::error::RefreshError;
use wayfare_core::{AccessToken, RefreshToken, SessionEndNotifier, TokenStore};

use crate::endpoints::{RefreshRequest, RefreshResponse};
use crate::request::api_error;

pub(crate) type RefreshOutcome = Result<AccessToken, RefreshError>;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Coordinates token refreshes for one client.
#[derive(Clone)]
pub(crate) struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    http: reqwest::Client,
    refresh_url: String,
    timeout: Duration,
    store: Arc<dyn TokenStore>,
    session_end: SessionEndNotifier,
    pending: Mutex<Option<PendingRefresh>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        http: reqwest::Client,
        refresh_url: String,
        timeout: Duration,
        store: Arc<dyn TokenStore>,
        session_end: SessionEndNotifier,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                http,
                refresh_url,
                timeout,
                store,
                session_end,
                pending: Mutex::new(None),
            }),
        }
    }

    /// Obtain a fresh access token, joining the in-flight refresh if there is one.
    pub(crate) async fn refresh(&self) -> RefreshOutcome {
        let pending = {
            let mut slot = self
                .inner
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    let pending = self.start();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// True while a refresh is in flight.
    #[cfg(test)]
    pub(crate) fn is_refreshing(&self) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // Called with the slot locked; the task cannot settle before the slot is filled.
    fn start(&self) -> PendingRefresh {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move { inner.run().await }
        });

        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // The slot was already cleared by the task's settle guard.
                    warn!(error = %err, "Token refresh task aborted, ending session");
                    let cleanup = tokio::spawn(async move { inner.end_session().await });
                    if let Err(err) = cleanup.await {
                        warn!(error = %err, "Session cleanup after aborted refresh failed");
                    }
                    Err(RefreshError::Aborted {
                        message: err.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl CoordinatorInner {
    #[instrument(skip(self), fields(url = %self.refresh_url))]
    async fn run(&self) -> RefreshOutcome {
        // Clears the slot on every exit path, including a panic in the store
        // or in the session-end callback.
        let _settle = SettleGuard(self);
        info!("Refreshing access token");

        let outcome = self.exchange().await;

        match &outcome {
            Ok(_) => info!("Access token refreshed"),
            Err(err) if err.is_expected() => {
                debug!("No refresh token stored, ending session");
            }
            Err(err) => warn!(error = %err, "Token refresh failed, ending session"),
        }

        if outcome.is_err() {
            self.end_session().await;
        }

        outcome
    }

    /// Exchange the stored refresh token for a new access token and persist it.
    async fn exchange(&self) -> RefreshOutcome {
        let refresh_token = match self.store.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return Err(RefreshError::NoRefreshToken),
            Err(err) => {
                warn!(error = %err, "Failed to read refresh token");
                return Err(RefreshError::NoRefreshToken);
            }
        };

        // Sent directly: no bearer token and no refresh handling.
        let response = self
            .http
            .post(&self.refresh_url)
            .header(ACCEPT, "application/json")
            .json(&RefreshRequest {
                refresh_token: refresh_token.as_str(),
            })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| RefreshError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| RefreshError::Transport {
                message: err.to_string(),
            })?;

        if !status.is_success() {
            let err = api_error(status, &body);
            return Err(RefreshError::Rejected {
                status: err.status,
                message: err.message,
            });
        }

        let parsed: RefreshResponse = serde_json::from_slice(&body).unwrap_or_default();
        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
            .ok_or(RefreshError::MissingAccessToken)?;

        self.persist(&access_token, parsed.refresh_token.map(RefreshToken::new))
            .await;

        Ok(access_token)
    }

    /// Best-effort persistence of the refreshed tokens.
    async fn persist(&self, access_token: &AccessToken, rotated: Option<RefreshToken>) {
        if let Err(err) = self.store.set_access_token(access_token).await {
            warn!(error = %err, "Failed to persist refreshed access token");
        }

        if let Some(refresh_token) = rotated {
            if let Err(err) = self.store.set_refresh_token(&refresh_token).await {
                warn!(error = %err, "Failed to persist rotated refresh token");
            }
        }
    }

    /// Clear local session state and notify the application.
    async fn end_session(&self) {
        if let Err(err) = self.store.clear_all().await {
            warn!(error = %err, "Failed to clear stored tokens");
        }
        if let Err(err) = self.store.clear_cached_user().await {
            warn!(error = %err, "Failed to clear cached user");
        }
        self.session_end.notify();
    }

    fn settle(&self) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

/// Empties the pending slot when dropped.
struct SettleGuard<'a>(&'a CoordinatorInner);

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.0.settle();
    }
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let refreshing = self
            .inner
            .pending
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.inner.refresh_url)
            .field("refreshing", &refreshing)
            .finish()
    }
}
