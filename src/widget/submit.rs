//! Form submission.

use std::sync::atomic::Ordering;

use tracing::{info, warn};

use super::{ChatWidget, WidgetInner};
use crate::transport::Role;

/// What a submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or no input/list to work with. Nothing changed.
    Ignored,
    /// A previous send is still awaiting the backend.
    Busy,
    /// The backend replied; the reply was rendered.
    Replied(String),
    /// The send failed; the apology was rendered.
    Apologized,
}

/// Restores the form after a send, on every exit path.
struct SendGuard<'a> {
    inner: &'a WidgetInner,
}

impl<'a> SendGuard<'a> {
    fn engage(inner: &'a WidgetInner) -> Self {
        if let Some(send) = &inner.bindings.send {
            send.set_disabled(true);
        }
        Self { inner }
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        let b = &self.inner.bindings;
        if let Some(send) = &b.send {
            send.set_disabled(false);
        }
        if let Some(input) = &b.input {
            self.inner.document.focus(input);
        }
        self.inner.in_flight.store(false, Ordering::Release);
    }
}

impl ChatWidget {
    /// Send the input field's text.
    ///
    /// The user's bubble is rendered before the request goes out. The send
    /// control stays disabled until the request settles, and a second
    /// submission in that window is rejected with [`SubmitOutcome::Busy`].
    pub async fn submit(&self) -> SubmitOutcome {
        let inner = &*self.inner;
        let (Some(input), Some(_)) = (&inner.bindings.input, &inner.bindings.messages) else {
            return SubmitOutcome::Ignored;
        };

        let text = input.value().trim().to_string();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return SubmitOutcome::Busy;
        }

        self.add_message(&text, Role::User);
        input.set_value("");
        let _guard = SendGuard::engage(inner);

        let session_id = self.session_id();
        match inner.backend.send_message(&session_id, &text).await {
            Ok(reply) => {
                info!(
                    name: "widget.send.replied",
                    session_id = %session_id,
                    chars = reply.reply.chars().count(),
                    "Bot reply received"
                );
                self.add_message(&reply.reply, Role::Bot);
                SubmitOutcome::Replied(reply.reply)
            }
            Err(e) => {
                warn!(
                    name: "widget.send.failed",
                    session_id = %session_id,
                    status = ?e.status(),
                    error = %e.detail_message(),
                    "Chat send failed"
                );
                self.add_message(&inner.apology, Role::Bot);
                SubmitOutcome::Apologized
            }
        }
    }
}
