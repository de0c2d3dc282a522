//! Backend chat service contract.
//!
//! The widget consumes two endpoints of an external chat service: one that
//! returns the stored conversation for a session and one that accepts a new
//! user message and returns the bot's reply. [`ChatBackend`] captures that
//! contract so the widget can run against [`HttpBackend`] in production and a
//! scripted fake in tests.
//!
//! # Wire format
//!
//! - `GET {base}/api/history?session_id=…` → `[{"role", "content", "ts"?}]`
//! - `POST {base}/api/chat` with `{"session_id", "message"}` → `{"reply"}`
//! - `GET {base}/api/health` → `{"ok"}`

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Visual role of a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Typed by the visitor.
    User,
    /// Produced by the backend.
    Bot,
}

impl Role {
    /// Map a wire role to a visual role. Anything but `"user"` is the bot.
    #[must_use]
    pub fn from_wire(role: &str) -> Self {
        if role == "user" { Self::User } else { Self::Bot }
    }

    /// Wire and style-class name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation entry.
///
/// `role` is kept as the raw wire string; backends are free to use names
/// other than `user`/`bot` (stored replies commonly come back as `model`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    /// Storage timestamp, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
            ts: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content)
    }

    /// Visual role of this entry.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_wire(&self.role)
    }
}

/// Body of a send request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
}

/// Body of a successful send response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Body of a health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
}

/// Transport failure.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        detail: String,
    },

    /// Connectivity, protocol, or body decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot address the endpoints.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TransportError {
    /// Human-readable cause for diagnostics.
    ///
    /// Error bodies shaped like `{"detail": …}` or `{"error": …}` are reduced
    /// to that field; anything else is returned verbatim.
    #[must_use]
    pub fn detail_message(&self) -> String {
        match self {
            Self::Status { detail, .. } => extract_detail(detail).unwrap_or_else(|| detail.clone()),
            other => other.to_string(),
        }
    }

    /// HTTP status code, when the backend produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidUrl(_) => None,
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error"].iter().find_map(|key| match value.get(*key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// The backend chat service as seen from the widget.
#[async_trait]
pub trait ChatBackend: Send + Sync + std::fmt::Debug {
    /// Stored conversation for `session_id`, oldest first.
    async fn fetch_history(&self, session_id: &str) -> Result<Vec<Message>, TransportError>;

    /// Submit `text` and wait for the bot's reply.
    async fn send_message(&self, session_id: &str, text: &str) -> Result<ChatReply, TransportError>;

    /// Liveness probe.
    async fn health(&self) -> Result<HealthStatus, TransportError>;
}
