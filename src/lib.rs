//! Stillwave chat widget
//!
//! A collapsible chat panel that lets a visitor exchange messages with a
//! backend chat service. The widget keeps a per-browser session identifier
//! in local storage and replays the stored conversation whenever the panel
//! opens.
//!
//! # Architecture
//!
//! - **Host page**: a headless element tree the widget binds to by id
//! - **Session**: timestamp-derived identifier persisted in key/value storage
//! - **Widget**: panel state, message rendering, and submit handling
//! - **Transport**: history and chat endpoints of the backend service
//!
//! # Modules
//!
//! - [`dom`]: element tree, focus, and event dispatch
//! - [`session`]: session identifier and local storage
//! - [`transport`]: backend contract and HTTP client
//! - [`widget`]: the chat widget itself
//! - [`config`]: layered configuration and CLI
//! - [`terminal`]: terminal host driving the widget

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod dom;
pub mod session;
pub mod terminal;
pub mod transport;
pub mod widget;

pub use dom::{Document, Element, EventKind};
pub use session::SessionManager;
pub use transport::{ChatBackend, HttpBackend, Message, Role, TransportError};
pub use widget::{ChatWidget, SubmitOutcome, WidgetOptions};
