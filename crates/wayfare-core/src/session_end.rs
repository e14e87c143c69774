//! Session-end callback slot.
//!
//! The application registers one handler (usually at startup) that moves
//! it to a logged-out state. Registering again replaces the handler.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Shared handle to the single session-end callback slot.
///
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct SessionEndNotifier {
    slot: Arc<Mutex<Option<Callback>>>,
}

impl SessionEndNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback, replacing any previous one.
    pub fn register<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(callback));
    }

    /// Remove the registered callback.
    pub fn unregister(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Returns true if a callback is registered.
    pub fn is_registered(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invoke the registered callback. Returns false if none is registered.
    ///
    /// A panicking callback is logged and does not propagate.
    pub fn notify(&self) -> bool {
        // Run outside the lock so the callback may re-register.
        let callback = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match callback {
            Some(callback) => {
                if panic::catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                    warn!("Session-end callback panicked");
                }
                true
            }
            None => {
                debug!("Session ended with no callback registered");
                false
            }
        }
    }
}

impl fmt::Debug for SessionEndNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEndNotifier")
            .field("registered", &self.is_registered())
            .finish()
    }
}
