//! Element nodes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::event::{Dispatched, Event, EventKind, Listener};

/// A node in the host page.
///
/// Cloning an `Element` yields another handle to the same node; equality is
/// node identity.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

struct ElementInner {
    tag: String,
    id: Option<String>,
    state: RwLock<ElementState>,
    listeners: RwLock<Vec<(EventKind, Listener)>>,
}

#[derive(Debug, Default)]
struct ElementState {
    text: String,
    value: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    children: Vec<Element>,
    scroll_top: usize,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl Element {
    /// Create a detached element with the given tag name.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self::build(tag.into(), None)
    }

    fn build(tag: String, id: Option<String>) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                tag: tag.to_ascii_lowercase(),
                id,
                state: RwLock::new(ElementState::default()),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Give the element an id, moving its state and listeners to the new node.
    /// Only valid before the element is shared.
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Self {
        let rebuilt = Self::build(self.inner.tag.clone(), Some(id.into()));
        {
            let mut from = self.write();
            let mut to = rebuilt.write();
            std::mem::swap(&mut *from, &mut *to);
        }
        {
            let mut from = self.inner.listeners.write().unwrap_or_else(PoisonError::into_inner);
            let mut to = rebuilt.inner.listeners.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::swap(&mut *from, &mut *to);
        }
        rebuilt
    }

    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    #[must_use]
    pub fn with_attribute(self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    #[must_use]
    pub fn with_child(self, child: Element) -> Self {
        self.append_child(child);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, ElementState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ElementState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lowercase tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────

    /// Own text followed by the text of all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let state = self.read();
        let mut out = state.text.clone();
        for child in &state.children {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.write().text = text.into();
    }

    /// Current value of a form field.
    #[must_use]
    pub fn value(&self) -> String {
        self.read().value.clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        self.write().value = value.into();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes and classes
    // ─────────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.read().attributes.get(name).cloned()
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.read().attributes.contains_key(name)
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.write()
            .attributes
            .insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.write().attributes.remove(name);
    }

    /// Toggle a boolean attribute such as `hidden` or `disabled`.
    pub fn set_flag(&self, name: &str, on: bool) {
        if on {
            self.set_attribute(name, "");
        } else {
            self.remove_attribute(name);
        }
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.has_attribute("hidden")
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.set_flag("hidden", hidden);
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.has_attribute("disabled")
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.set_flag("disabled", disabled);
    }

    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.read().classes.clone()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.read().classes.iter().any(|c| c == class)
    }

    pub fn add_class(&self, class: &str) {
        let mut state = self.write();
        if !state.classes.iter().any(|c| c == class) {
            state.classes.push(class.to_string());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tree
    // ─────────────────────────────────────────────────────────────────────────

    pub fn append_child(&self, child: Element) {
        self.write().children.push(child);
    }

    /// Remove every child and reset the scroll offset.
    pub fn clear_children(&self) {
        let mut state = self.write();
        state.children.clear();
        state.scroll_top = 0;
    }

    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.read().children.clone()
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.read().children.len()
    }

    /// All descendants in document order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scrolling
    // ─────────────────────────────────────────────────────────────────────────

    /// Scrollable extent, measured in rows (one per child).
    #[must_use]
    pub fn scroll_height(&self) -> usize {
        self.child_count()
    }

    #[must_use]
    pub fn scroll_top(&self) -> usize {
        self.read().scroll_top
    }

    pub fn scroll_to_bottom(&self) {
        let mut state = self.write();
        state.scroll_top = state.children.len();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_event_listener<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&mut Event) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, Arc::new(listener)));
    }

    /// Run every listener registered for `kind` on this element.
    ///
    /// Listeners run without any element lock held, so they may freely
    /// mutate the tree.
    pub fn dispatch(&self, kind: EventKind) -> Dispatched {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| Arc::clone(l))
            .collect();

        let mut event = Event::new(kind);
        for listener in listeners {
            listener(&mut event);
        }
        event.finish()
    }
}
