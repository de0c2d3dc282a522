//! Element bindings resolved at mount time.

use serde::Deserialize;
use thiserror::Error;

use crate::dom::{Document, Element};

/// Ids of the host page elements the widget binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DomIds {
    pub toggle: String,
    pub panel: String,
    pub close: String,
    pub messages: String,
    pub form: String,
    pub input: String,
    pub send: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            toggle: "chat-toggle".to_string(),
            panel: "chat-panel".to_string(),
            close: "chat-close".to_string(),
            messages: "chat-messages".to_string(),
            form: "chat-form".to_string(),
            input: "chat-input".to_string(),
            send: "chat-send".to_string(),
        }
    }
}

/// The widget cannot attach to the page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    #[error("required {role} element #{id} not found")]
    MissingElement { role: &'static str, id: String },
}

/// Resolved element handles. Everything but the toggle and panel is optional.
#[derive(Debug, Clone)]
pub(crate) struct Bindings {
    pub toggle: Element,
    pub panel: Element,
    pub close: Option<Element>,
    pub messages: Option<Element>,
    pub form: Option<Element>,
    pub input: Option<Element>,
    pub send: Option<Element>,
}

impl Bindings {
    pub fn resolve(document: &Document, ids: &DomIds) -> Result<Self, MountError> {
        let required = |role: &'static str, id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_else(|| MountError::MissingElement {
                    role,
                    id: id.to_string(),
                })
        };

        Ok(Self {
            toggle: required("toggle", &ids.toggle)?,
            panel: required("panel", &ids.panel)?,
            close: document.get_element_by_id(&ids.close),
            messages: document.get_element_by_id(&ids.messages),
            form: document.get_element_by_id(&ids.form),
            input: document.get_element_by_id(&ids.input),
            send: document.get_element_by_id(&ids.send),
        })
    }

    /// Names of optional elements that are absent, for the mount log.
    pub fn missing_optional(&self) -> Vec<&'static str> {
        [
            ("close", self.close.is_some()),
            ("messages", self.messages.is_some()),
            ("form", self.form.is_some()),
            ("input", self.input.is_some()),
            ("send", self.send.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| (!present).then_some(name))
        .collect()
    }
}

/// Whether `el` is a "learn more" affordance the widget should hijack.
pub(crate) fn is_learn_more(el: &Element) -> bool {
    if !matches!(el.tag(), "a" | "button") {
        return false;
    }
    let label = el.attribute("aria-label").unwrap_or_default();
    [el.text_content(), label]
        .iter()
        .any(|text| text.to_lowercase().contains("learn more"))
}
