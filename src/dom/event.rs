//! Event dispatch primitives.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::warn;

/// Kinds of events the host page can deliver to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Pointer activation of a control or link.
    Click,
    /// Form submission.
    Submit,
}

/// Callback registered on an element.
pub type Listener = Arc<dyn Fn(&mut Event) + Send + Sync>;

/// An in-flight event passed to each listener in registration order.
///
/// Listeners that kick off asynchronous work hand the task to the event with
/// [`Event::track`] so the dispatcher can await it later.
#[derive(Debug)]
pub struct Event {
    kind: EventKind,
    default_prevented: bool,
    pending: Vec<JoinHandle<()>>,
}

impl Event {
    pub(crate) fn new(kind: EventKind) -> Self {
        Self {
            kind,
            default_prevented: false,
            pending: Vec::new(),
        }
    }

    /// The kind of event being dispatched.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Suppress the element's default action (link navigation, form post).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether any listener suppressed the default action.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Attach a spawned task to this event.
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.pending.push(handle);
    }

    pub(crate) fn finish(self) -> Dispatched {
        Dispatched {
            default_prevented: self.default_prevented,
            pending: self.pending,
        }
    }
}

/// Result of dispatching an event.
///
/// Dropping it detaches any background work the listeners started.
#[derive(Debug)]
pub struct Dispatched {
    default_prevented: bool,
    pending: Vec<JoinHandle<()>>,
}

impl Dispatched {
    /// Whether the default action was suppressed.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Number of background tasks started by listeners.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every task the listeners started.
    pub async fn settled(self) {
        for result in join_all(self.pending).await {
            if let Err(e) = result {
                warn!(name: "dom.listener.failed", error = %e, "Listener task failed");
            }
        }
    }
}
