//! Stillwave chat widget, terminal host.
//!
//! Entry point that mounts the widget on a terminal-rendered host page.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use stillwave_widget::config::WidgetConfig;
use stillwave_widget::session::{FileStorage, SessionManager};
use stillwave_widget::terminal::{TerminalHost, host_page};
use stillwave_widget::transport::{ChatBackend, HttpBackend};
use stillwave_widget::widget::ChatWidget;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED); stdout belongs to the conversation.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match WidgetConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        name: "widget.config.loaded",
        base_url = %config.backend.base_url,
        storage = %config.storage.path.display(),
        "Widget configuration loaded"
    );

    let backend = Arc::new(
        HttpBackend::new(&config.backend.base_url).context("invalid backend base URL")?,
    );
    match backend.health().await {
        Ok(status) => info!(name: "backend.health", ok = status.ok, "Backend reachable"),
        Err(e) => warn!(name: "backend.health", error = %e, "Backend not reachable yet"),
    }

    let storage = Arc::new(FileStorage::open(&config.storage.path));
    let sessions = SessionManager::new(storage, config.storage.session_key.clone());

    let page = host_page(&config.dom);
    let widget = ChatWidget::mount(&page, config.widget_options(), sessions, backend)
        .context("chat widget failed to mount")?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut host = TerminalHost::new(widget, config.dom.clone(), config.terminal.cps, std::io::stdout());
    host.run(stdin).await.context("terminal I/O failed")?;

    Ok(())
}
