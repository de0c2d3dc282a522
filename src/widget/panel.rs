//! Panel visibility, focus, and ARIA state.

use tracing::debug;

use super::{ChatWidget, HistoryLoad};

impl ChatWidget {
    /// Whether the panel is showing.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.inner.bindings.panel.is_hidden()
    }

    /// Reveal the panel, focus the input, and start a history load.
    ///
    /// The panel is usable immediately; the returned load may be awaited or
    /// dropped.
    pub fn open(&self) -> HistoryLoad {
        let b = &self.inner.bindings;
        b.panel.set_hidden(false);
        b.panel.set_attribute("aria-hidden", "false");
        b.toggle.set_attribute("aria-expanded", "true");
        if let Some(input) = &b.input {
            self.inner.document.focus(input);
        }
        debug!(name: "widget.panel.opened", "Chat panel opened");

        self.spawn_history_load()
    }

    /// Hide the panel.
    pub fn close(&self) {
        let b = &self.inner.bindings;
        b.panel.set_hidden(true);
        b.panel.set_attribute("aria-hidden", "true");
        b.toggle.set_attribute("aria-expanded", "false");
        debug!(name: "widget.panel.closed", "Chat panel closed");
    }

    /// Open when closed, close when open.
    ///
    /// Returns the history load when this call opened the panel.
    pub fn toggle(&self) -> Option<HistoryLoad> {
        if self.is_open() {
            self.close();
            None
        } else {
            Some(self.open())
        }
    }
}
