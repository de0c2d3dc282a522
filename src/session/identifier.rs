//! Session identifier generation and lookup.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDateTime};
use tracing::info;

use super::storage::KeyValueStore;

/// Storage key used when none is configured.
pub const DEFAULT_SESSION_KEY: &str = "stillwave_session_id";

/// Source of the local wall-clock time used to mint identifiers.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Format a timestamp as a session identifier (`YYYY-MM-DD-HHMMSS`).
#[must_use]
pub fn format_session_id(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d-%H%M%S").to_string()
}

/// Produces and persists the per-browser session identifier.
///
/// Every call reads through to storage, so clearing the key makes the next
/// call mint a fresh identifier. Clones share one lock, so concurrent first
/// calls agree on a single identifier.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Clock,
    mint: Arc<Mutex<()>>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Manager using the local clock.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::with_clock(store, key, Arc::new(|| Local::now().naive_local()))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            clock,
            mint: Arc::new(Mutex::new(())),
        }
    }

    /// Storage key holding the identifier.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored identifier, minting and storing one if absent.
    pub fn session_id(&self) -> String {
        let _mint = self.mint.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = self
            .store
            .get_item(&self.key)
            .filter(|id| !id.trim().is_empty())
        {
            return existing;
        }

        let id = format_session_id((self.clock)());
        self.store.set_item(&self.key, &id);
        info!(name: "session.created", session_id = %id, "Session identifier created");
        id
    }

    /// Forget the stored identifier.
    pub fn clear(&self) {
        let _mint = self.mint.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.remove_item(&self.key);
    }
}
