//! Headless host page model.
//!
//! The widget never talks to a rendering surface directly. It binds to
//! elements of a [`Document`] by id, flips attributes on them, appends
//! children, and listens for events. A host (the terminal front end, or a
//! test) owns the document, delivers events with [`Document::dispatch`], and
//! reads the resulting tree back.
//!
//! # Example
//!
//! ```rust
//! use stillwave_widget::dom::{Document, Element, EventKind};
//!
//! let doc = Document::new();
//! doc.body().append_child(Element::new("button").with_id("go").with_text("Go"));
//!
//! let button = doc.get_element_by_id("go").unwrap();
//! button.add_event_listener(EventKind::Click, |event| event.prevent_default());
//!
//! let dispatched = doc.dispatch("go", EventKind::Click).unwrap();
//! assert!(dispatched.default_prevented());
//! ```

mod element;
mod event;

pub use element::Element;
pub use event::{Dispatched, Event, EventKind, Listener};

use std::sync::{Arc, PoisonError, RwLock};

/// A host page: a `body` element plus focus tracking.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

#[derive(Debug)]
struct DocumentInner {
    body: Element,
    active: RwLock<Option<Element>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                body: Element::new("body"),
                active: RwLock::new(None),
            }),
        }
    }

    #[must_use]
    pub fn body(&self) -> &Element {
        &self.inner.body
    }

    /// First element in document order carrying `id`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.inner
            .body
            .descendants()
            .into_iter()
            .find(|el| el.id() == Some(id))
    }

    /// Every element matching `predicate`, in document order.
    #[must_use]
    pub fn query_all<F>(&self, predicate: F) -> Vec<Element>
    where
        F: Fn(&Element) -> bool,
    {
        self.inner
            .body
            .descendants()
            .into_iter()
            .filter(|el| predicate(el))
            .collect()
    }

    /// Move input focus to `element`.
    pub fn focus(&self, element: &Element) {
        *self
            .inner
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(element.clone());
    }

    /// The element holding focus, if any.
    #[must_use]
    pub fn active_element(&self) -> Option<Element> {
        self.inner
            .active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `element` currently holds focus.
    #[must_use]
    pub fn has_focus(&self, element: &Element) -> bool {
        self.active_element().as_ref() == Some(element)
    }

    /// Deliver an event to the element with `id`.
    ///
    /// Returns `None` when no such element exists.
    pub fn dispatch(&self, id: &str, kind: EventKind) -> Option<Dispatched> {
        self.get_element_by_id(id).map(|el| el.dispatch(kind))
    }
}
