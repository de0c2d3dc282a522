//! Message log rendering.

use std::fmt::Write;

use crate::dom::Element;
use crate::transport::{Message, Role};

use super::ChatWidget;

/// Class shared by every chat bubble.
const BUBBLE_CLASS: &str = "msg";

fn bubble(text: &str, role: Role, ts: Option<&str>) -> Element {
    let el = Element::new("div")
        .with_class(BUBBLE_CLASS)
        .with_class(role.as_str())
        .with_attribute("data-role", role.as_str())
        .with_text(text);
    if let Some(ts) = ts {
        el.set_attribute("data-ts", ts);
    }
    el
}

impl ChatWidget {
    /// Append one bubble and scroll it into view.
    pub fn add_message(&self, text: &str, who: Role) {
        self.append(text, who, None);
    }

    fn append(&self, text: &str, who: Role, ts: Option<&str>) {
        let Some(list) = &self.inner.bindings.messages else {
            return;
        };
        list.append_child(bubble(text, who, ts));
        list.scroll_to_bottom();
    }

    /// Replace the log with `messages`, in order.
    pub fn render_history(&self, messages: &[Message]) {
        let Some(list) = &self.inner.bindings.messages else {
            return;
        };
        list.clear_children();
        for message in messages {
            self.append(&message.content, message.role(), message.ts.as_deref());
        }
    }

    /// The rendered log, read back from the page.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        let Some(list) = &self.inner.bindings.messages else {
            return Vec::new();
        };
        list.children()
            .iter()
            .filter(|el| el.has_class(BUBBLE_CLASS))
            .map(|el| {
                let role = Role::from_wire(&el.attribute("data-role").unwrap_or_default());
                Message {
                    ts: el.attribute("data-ts"),
                    ..Message::new(role, el.text_content())
                }
            })
            .collect()
    }

    /// Markdown transcript of the rendered log.
    #[must_use]
    pub fn export_markdown(&self) -> String {
        let mut out = format!("# Session {}\n\n", self.session_id());
        for message in self.messages() {
            let who = match message.role() {
                Role::User => "User",
                Role::Bot => "Bot",
            };
            match &message.ts {
                Some(ts) => {
                    let _ = write!(out, "**{who} ({ts})**");
                }
                None => {
                    let _ = write!(out, "**{who}**");
                }
            }
            let _ = write!(out, "\n\n{}\n\n", message.content);
        }
        out
    }
}
