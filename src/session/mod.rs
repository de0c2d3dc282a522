//! Session identifier management.
//!
//! The widget groups every message from one browser into one backend
//! conversation by sending a client-minted identifier with each request. The
//! identifier is derived from the local time of first use and kept in
//! persistent key/value storage so it survives reloads.
//!
//! # Architecture
//!
//! - [`KeyValueStore`]: local-storage style persistence
//! - [`MemoryStorage`] / [`FileStorage`]: volatile and on-disk stores
//! - [`SessionManager`]: read-through accessor for the identifier
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use stillwave_widget::session::{MemoryStorage, SessionManager, DEFAULT_SESSION_KEY};
//!
//! let sessions = SessionManager::new(Arc::new(MemoryStorage::new()), DEFAULT_SESSION_KEY);
//! let id = sessions.session_id();
//! assert_eq!(id, sessions.session_id());
//! assert_eq!(id.len(), "YYYY-MM-DD-HHMMSS".len());
//! ```

mod identifier;
mod storage;

pub use identifier::{Clock, DEFAULT_SESSION_KEY, SessionManager, format_session_id};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
