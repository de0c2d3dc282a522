//! HTTP implementation of [`ChatBackend`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{ChatBackend, ChatReply, ChatRequest, HealthStatus, Message, TransportError};

/// Talks to the chat service over HTTP.
///
/// # Example
///
/// ```rust,no_run
/// use stillwave_widget::transport::{ChatBackend, HttpBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = HttpBackend::new("http://127.0.0.1:8000")?;
/// let reply = backend.send_message("2025-01-01-120000", "Hello").await?;
/// println!("{}", reply.reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url`.
    ///
    /// Endpoints are resolved relative to the base, so a base with a path
    /// prefix (`https://host/chatbot`) keeps that prefix.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, TransportError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, http })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(TransportError::Status {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_history(&self, session_id: &str) -> Result<Vec<Message>, TransportError> {
        let mut url = self.url("api/history")?;
        url.query_pairs_mut().append_pair("session_id", session_id);

        debug!(name: "transport.history.request", url = %url);
        let response = self.http.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn send_message(&self, session_id: &str, text: &str) -> Result<ChatReply, TransportError> {
        let url = self.url("api/chat")?;

        debug!(name: "transport.chat.request", url = %url, chars = text.chars().count());
        let response = self
            .http
            .post(url)
            .json(&ChatRequest {
                session_id,
                message: text,
            })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        let response = self.http.get(self.url("api/health")?).send().await?;
        Self::handle_response(response).await
    }
}
