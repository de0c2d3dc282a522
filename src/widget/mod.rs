//! The chat widget.
//!
//! A [`ChatWidget`] attaches to a host [`Document`], binding a toggle
//! control, a panel, and (optionally) a message list and a send form. It
//! composes four concerns:
//!
//! - **Session**: the identifier sent with every request ([`SessionManager`])
//! - **Panel**: open/close/toggle with focus and ARIA state (`panel.rs`)
//! - **Renderer**: chat bubbles in the message list (`renderer.rs`)
//! - **Transport**: history replay and message submission (`history.rs`, `submit.rs`)
//!
//! Each widget owns its element bindings and session; nothing is global, so
//! several widgets can live side by side on different documents.
//!
//! When the message list or form pieces are missing the widget still mounts
//! in a degraded mode where rendering and sending are no-ops. The toggle and
//! panel are mandatory.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stillwave_widget::dom::Document;
//! use stillwave_widget::session::{MemoryStorage, SessionManager, DEFAULT_SESSION_KEY};
//! use stillwave_widget::transport::HttpBackend;
//! use stillwave_widget::widget::{ChatWidget, WidgetOptions};
//!
//! # async fn example(page: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let sessions = SessionManager::new(Arc::new(MemoryStorage::new()), DEFAULT_SESSION_KEY);
//! let backend = Arc::new(HttpBackend::new("http://127.0.0.1:8000")?);
//! let widget = ChatWidget::mount(&page, WidgetOptions::default(), sessions, backend)?;
//!
//! widget.open().wait().await;
//! # Ok(())
//! # }
//! ```

mod bindings;
mod history;
mod panel;
mod renderer;
mod submit;

pub use bindings::{DomIds, MountError};
pub use history::HistoryLoad;
pub use submit::SubmitOutcome;

use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dom::{Document, Event, EventKind};
use crate::session::SessionManager;
use crate::transport::ChatBackend;
use bindings::{Bindings, is_learn_more};

/// Bot entry shown when a send fails.
pub const DEFAULT_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// Mount-time settings.
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Element ids to bind.
    pub ids: DomIds,
    /// Fixed bot message rendered in place of a failed reply.
    pub apology: String,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            ids: DomIds::default(),
            apology: DEFAULT_APOLOGY.to_string(),
        }
    }
}

/// Handle to a mounted chat widget. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatWidget {
    inner: Arc<WidgetInner>,
}

#[derive(Debug)]
struct WidgetInner {
    document: Document,
    bindings: Bindings,
    sessions: SessionManager,
    backend: Arc<dyn ChatBackend>,
    apology: String,
    /// Set while a send is awaiting the backend.
    in_flight: AtomicBool,
}

impl ChatWidget {
    /// Bind to `document` and wire event listeners.
    ///
    /// The widget starts closed. A missing toggle or panel is logged and
    /// returned as an error; nothing is wired in that case.
    pub fn mount(
        document: &Document,
        options: WidgetOptions,
        sessions: SessionManager,
        backend: Arc<dyn ChatBackend>,
    ) -> Result<Self, MountError> {
        let bindings = Bindings::resolve(document, &options.ids).inspect_err(|e| {
            warn!(name: "widget.mount.failed", error = %e, "Chat widget not initialized");
        })?;

        let degraded = bindings.missing_optional();

        let widget = Self {
            inner: Arc::new(WidgetInner {
                document: document.clone(),
                bindings,
                sessions,
                backend,
                apology: options.apology,
                in_flight: AtomicBool::new(false),
            }),
        };

        widget.close();
        let learn_more = widget.wire();

        info!(
            name: "widget.mounted",
            session_key = %widget.inner.sessions.key(),
            learn_more,
            degraded = ?degraded,
            "Chat widget mounted"
        );

        Ok(widget)
    }

    /// The document this widget is bound to.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Current session identifier (minted on first use).
    pub fn session_id(&self) -> String {
        self.inner.sessions.session_id()
    }

    fn downgrade(&self) -> Weak<WidgetInner> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<WidgetInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Register listeners. Returns the number of "learn more" elements wired.
    fn wire(&self) -> usize {
        let b = &self.inner.bindings;

        let weak = self.downgrade();
        b.toggle.add_event_listener(EventKind::Click, move |event| {
            if let Some(load) = Self::upgrade(&weak).and_then(|w| w.toggle()) {
                load.attach(event);
            }
        });

        if let Some(close) = &b.close {
            let weak = self.downgrade();
            close.add_event_listener(EventKind::Click, move |_| {
                if let Some(widget) = Self::upgrade(&weak) {
                    widget.close();
                }
            });
        }

        if let Some(form) = &b.form {
            let weak = self.downgrade();
            form.add_event_listener(EventKind::Submit, move |event| {
                event.prevent_default();
                if let Some(widget) = Self::upgrade(&weak) {
                    spawn_tracked(event, async move {
                        let _ = widget.submit().await;
                    });
                }
            });
        }

        let own = [&b.toggle, &b.panel];
        let links = self
            .inner
            .document
            .query_all(|el| is_learn_more(el) && !own.contains(&el));
        for link in &links {
            let weak = self.downgrade();
            link.add_event_listener(EventKind::Click, move |event| {
                event.prevent_default();
                if let Some(widget) = Self::upgrade(&weak) {
                    widget.open().attach(event);
                }
            });
        }

        links.len()
    }
}

/// Spawn `fut` on the ambient runtime.
///
/// Listeners can fire outside any runtime (a host driving the page
/// synchronously); the work is skipped with a warning in that case.
fn spawn_tracked_handle<F>(fut: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(fut)),
        Err(e) => {
            warn!(name: "widget.spawn.failed", error = %e, "No async runtime for listener");
            None
        }
    }
}

/// Spawn `fut` and attach it to `event`.
fn spawn_tracked<F>(event: &mut Event, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Some(handle) = spawn_tracked_handle(fut) {
        event.track(handle);
    }
}
