//! History replay.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ChatWidget, spawn_tracked_handle};
use crate::dom::Event;
use crate::transport::Message;

/// A history load started by opening the panel.
///
/// Dropping it lets the load finish in the background.
#[derive(Debug)]
pub struct HistoryLoad {
    handle: Option<JoinHandle<()>>,
}

impl HistoryLoad {
    pub(crate) fn none() -> Self {
        Self { handle: None }
    }

    /// Whether a fetch was actually started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// Wait for the load to finish (successfully or not).
    pub async fn wait(self) {
        let Some(handle) = self.handle else {
            return;
        };
        if let Err(e) = handle.await {
            warn!(name: "widget.history.failed", error = %e, "History task aborted");
        }
    }

    /// Hand the load to an in-flight event so the dispatcher can await it.
    pub(crate) fn attach(self, event: &mut Event) {
        if let Some(handle) = self.handle {
            event.track(handle);
        }
    }
}

impl ChatWidget {
    /// Start a background history load, unless there is nowhere to render it.
    pub(crate) fn spawn_history_load(&self) -> HistoryLoad {
        if self.inner.bindings.messages.is_none() {
            return HistoryLoad::none();
        }
        let widget = self.clone();
        HistoryLoad {
            handle: spawn_tracked_handle(async move {
                widget.load_history().await;
            }),
        }
    }

    /// Fetch the session's history and replace the rendered log with it.
    ///
    /// Failures leave the log untouched and are only logged. Returns whether
    /// the log was repopulated.
    pub async fn load_history(&self) -> bool {
        match self.fetch_history().await {
            Some(messages) => {
                self.render_history(&messages);
                true
            }
            None => false,
        }
    }

    /// The session's history, or `None` if it could not be retrieved.
    pub async fn fetch_history(&self) -> Option<Vec<Message>> {
        let session_id = self.session_id();
        match self.inner.backend.fetch_history(&session_id).await {
            Ok(messages) => {
                debug!(
                    name: "widget.history.loaded",
                    session_id = %session_id,
                    count = messages.len()
                );
                Some(messages)
            }
            Err(e) => {
                warn!(
                    name: "widget.history.failed",
                    session_id = %session_id,
                    status = ?e.status(),
                    error = %e.detail_message(),
                    "Could not load chat history"
                );
                None
            }
        }
    }
}
