use crate::session::DEFAULT_SESSION_KEY;
use crate::widget::{DEFAULT_APOLOGY, DomIds, WidgetOptions};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Base URL of the chat backend
    #[arg(long, env = "STILLWAVE_BASE_URL")]
    pub base_url: Option<String>,

    /// File holding persisted widget state (the session identifier)
    #[arg(long, env = "STILLWAVE_STORAGE__PATH")]
    pub storage: Option<PathBuf>,

    /// Typing speed for bot replies in characters per second (0 = instant)
    #[arg(long)]
    pub cps: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub dom: DomIds,
    pub messages: MessagesConfig,
    pub terminal: TerminalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub session_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagesConfig {
    pub apology: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TerminalConfig {
    pub cps: u32,
}

impl WidgetConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Resolve configuration with priority
    /// CLI flag > CLI env var > `STILLWAVE_*` env > config file > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let dom = DomIds::default();
        let mut builder = Config::builder()
            .set_default("backend.base_url", "http://127.0.0.1:8000/")?
            .set_default("storage.path", "stillwave-storage.json")?
            .set_default("storage.session_key", DEFAULT_SESSION_KEY)?
            .set_default("dom.toggle", dom.toggle)?
            .set_default("dom.panel", dom.panel)?
            .set_default("dom.close", dom.close)?
            .set_default("dom.messages", dom.messages)?
            .set_default("dom.form", dom.form)?
            .set_default("dom.input", dom.input)?
            .set_default("dom.send", dom.send)?
            .set_default("messages.apology", DEFAULT_APOLOGY)?
            .set_default("terminal.cps", 0)?;

        // An explicit file must exist; the working-directory fallback is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("stillwave").required(false)),
        };

        // E.g. STILLWAVE_BACKEND__BASE_URL=https://chat.example.com
        builder = builder.add_source(
            Environment::with_prefix("STILLWAVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = cli.base_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(path) = cli.storage {
            builder = builder.set_override("storage.path", path.to_string_lossy().into_owned())?;
        }
        if let Some(cps) = cli.cps {
            builder = builder.set_override("terminal.cps", i64::from(cps))?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Mount options for the widget.
    #[must_use]
    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            ids: self.dom.clone(),
            apology: self.messages.apology.clone(),
        }
    }
}
