//! Terminal host for the chat widget.
//!
//! Builds a small host page, mounts the widget on it, and turns typed lines
//! into page events: slash commands click controls, anything else is typed
//! into the message field and submitted. After each event settles the new
//! log entries are printed.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::dom::{Document, Element, EventKind};
use crate::transport::{Message, Role};
use crate::widget::{ChatWidget, DomIds};

/// Id of the "learn more" link on the host page.
pub const LEARN_MORE_ID: &str = "learn-more";

const HELP: &str = "\
Commands:
  /open          open the chat panel
  /close         close the chat panel
  /toggle        click the chat button
  /learn-more    click the page's \"Learn more\" link
  /export [path] save the conversation as Markdown
  /help          show this help
  /quit          exit
Anything else is sent as a chat message.";

/// Build a host page carrying every element the widget binds to.
#[must_use]
pub fn host_page(ids: &DomIds) -> Document {
    let doc = Document::new();

    doc.body().append_child(
        Element::new("button")
            .with_id(&ids.toggle)
            .with_attribute("aria-controls", &ids.panel)
            .with_text("Chat with us"),
    );

    let form = Element::new("form")
        .with_id(&ids.form)
        .with_child(
            Element::new("input")
                .with_id(&ids.input)
                .with_attribute("placeholder", "Type your message..."),
        )
        .with_child(Element::new("button").with_id(&ids.send).with_text("Send"));

    doc.body().append_child(
        Element::new("section")
            .with_id(&ids.panel)
            .with_attribute("role", "dialog")
            .with_child(
                Element::new("button")
                    .with_id(&ids.close)
                    .with_attribute("aria-label", "Close chat"),
            )
            .with_child(
                Element::new("div")
                    .with_id(&ids.messages)
                    .with_attribute("aria-live", "polite"),
            )
            .with_child(form),
    );

    doc.body().append_child(
        Element::new("a")
            .with_id(LEARN_MORE_ID)
            .with_attribute("href", "/about")
            .with_text("Learn more"),
    );

    doc
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Toggle,
    LearnMore,
    Export(Option<PathBuf>),
    Help,
    Quit,
    Say(String),
    Unknown(String),
}

impl Command {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };
        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(n, a)| (n, a.trim()));
        match name {
            "open" => Self::Open,
            "close" => Self::Close,
            "toggle" => Self::Toggle,
            "learn-more" => Self::LearnMore,
            "export" => Self::Export((!arg.is_empty()).then(|| PathBuf::from(arg))),
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Whether the host loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drives a mounted widget from a line-oriented terminal.
#[derive(Debug)]
pub struct TerminalHost<W> {
    widget: ChatWidget,
    ids: DomIds,
    cps: u32,
    out: W,
    shown: Vec<Message>,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(widget: ChatWidget, ids: DomIds, cps: u32, out: W) -> Self {
        Self {
            widget,
            ids,
            cps,
            out,
            shown: Vec::new(),
        }
    }

    fn document(&self) -> &Document {
        self.widget.document()
    }

    /// Read commands until end of input or `/quit`.
    pub async fn run<R>(&mut self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "{HELP}")?;
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if self.execute(Command::parse(&line)).await? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Apply one command and print whatever it changed.
    pub async fn execute(&mut self, command: Command) -> std::io::Result<Flow> {
        match command {
            Command::Open => self.widget.open().wait().await,
            Command::Close => self.click(&self.ids.close).await,
            Command::Toggle => self.click(&self.ids.toggle).await,
            Command::LearnMore => {
                if let Some(dispatched) = self.document().dispatch(LEARN_MORE_ID, EventKind::Click) {
                    let prevented = dispatched.default_prevented();
                    dispatched.settled().await;
                    if !prevented {
                        writeln!(self.out, "(following link)")?;
                    }
                }
            }
            Command::Export(path) => self.export(path).await?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(name) => writeln!(self.out, "Unknown command /{name}; try /help")?,
            Command::Say(text) => {
                if !self.widget.is_open() {
                    writeln!(self.out, "(the chat is closed; type /open first)")?;
                } else if let Some(input) = self.document().get_element_by_id(&self.ids.input) {
                    input.set_value(text);
                    self.submit().await;
                }
            }
        }
        self.refresh().await?;
        Ok(Flow::Continue)
    }

    async fn click(&self, id: &str) {
        if let Some(dispatched) = self.document().dispatch(id, EventKind::Click) {
            dispatched.settled().await;
        }
    }

    async fn submit(&self) {
        if let Some(dispatched) = self.document().dispatch(&self.ids.form, EventKind::Submit) {
            dispatched.settled().await;
        }
    }

    async fn export(&mut self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path
            .unwrap_or_else(|| PathBuf::from(format!("session_{}.md", self.widget.session_id())));
        tokio::fs::write(&path, self.widget.export_markdown()).await?;
        info!(name: "terminal.export", path = %path.display(), "Transcript exported");
        writeln!(self.out, "Exported to {}", path.display())
    }

    /// Print entries added since the last refresh, or the whole log if it
    /// was replaced.
    async fn refresh(&mut self) -> std::io::Result<()> {
        let current = self.widget.messages();
        if current == self.shown {
            return Ok(());
        }

        let fresh = if current.starts_with(&self.shown) {
            current[self.shown.len()..].to_vec()
        } else {
            writeln!(self.out, "--- conversation ---")?;
            current.clone()
        };

        for message in &fresh {
            self.print(message).await?;
        }
        self.shown = current;
        Ok(())
    }

    async fn print(&mut self, message: &Message) -> std::io::Result<()> {
        match message.role() {
            Role::User => writeln!(self.out, "You: {}", message.content),
            Role::Bot => {
                write!(self.out, "Bot: ")?;
                self.type_out(&message.content).await?;
                writeln!(self.out)
            }
        }
    }

    async fn type_out(&mut self, text: &str) -> std::io::Result<()> {
        if self.cps == 0 {
            return write!(self.out, "{text}");
        }
        let base = Duration::from_secs(1) / self.cps;
        for ch in text.chars() {
            write!(self.out, "{ch}")?;
            self.out.flush()?;
            tokio::time::sleep(base * pause_factor(ch)).await;
        }
        Ok(())
    }

    /// Consume the host, returning its output sink.
    pub fn into_output(self) -> W {
        self.out
    }
}

/// Multiple of the per-character delay to wait after `ch`.
fn pause_factor(ch: char) -> u32 {
    match ch {
        '.' | '!' | '?' => 8,
        '\n' => 6,
        ',' | ';' | ':' => 4,
        _ => 1,
    }
}
