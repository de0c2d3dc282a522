use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use stillwave_widget::dom::{Document, Element, EventKind};
use stillwave_widget::session::{FileStorage, KeyValueStore, MemoryStorage, SessionManager};
use stillwave_widget::terminal::{LEARN_MORE_ID, host_page};
use stillwave_widget::transport::{ChatBackend, HttpBackend, Message, TransportError};
use stillwave_widget::widget::{
    ChatWidget, DEFAULT_APOLOGY, DomIds, MountError, SubmitOutcome, WidgetOptions,
};

// ─────────────────────────────────────────────────────────────────────────────
// Mock chat service
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct MockService {
    /// Stored turns per session, as the service would persist them.
    history: Arc<Mutex<HashMap<String, Vec<serde_json::Value>>>>,
    fail_history: Arc<AtomicBool>,
    fail_chat: Arc<AtomicBool>,
}

impl MockService {
    fn seed(&self, session_id: &str, turns: serde_json::Value) {
        let turns = turns.as_array().cloned().unwrap_or_default();
        self.history
            .lock()
            .unwrap()
            .insert(session_id.to_string(), turns);
    }
}

#[derive(Deserialize)]
struct ChatIn {
    session_id: String,
    message: String,
}

async fn history(
    State(svc): State<MockService>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if svc.fail_history.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database locked").into_response();
    }
    let Some(session_id) = params.get("session_id") else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "session_id missing").into_response();
    };
    let turns = svc
        .history
        .lock()
        .unwrap()
        .get(session_id)
        .cloned()
        .unwrap_or_default();
    Json(turns).into_response()
}

async fn chat(State(svc): State<MockService>, Json(body): Json<ChatIn>) -> Response {
    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "message is required"})),
        )
            .into_response();
    }
    if svc.fail_chat.load(Ordering::SeqCst) {
        return (StatusCode::BAD_GATEWAY, Json(json!({"detail": "Empty response from model"})))
            .into_response();
    }

    let reply = if body.message == "Hello" {
        "Hi there".to_string()
    } else {
        format!("You said: {}", body.message)
    };

    let mut store = svc.history.lock().unwrap();
    let turns = store.entry(body.session_id).or_default();
    turns.push(json!({"role": "user", "content": body.message, "ts": "2025-01-01T10:00:00+00:00"}));
    turns.push(json!({"role": "model", "content": reply, "ts": "2025-01-01T10:00:01+00:00"}));

    Json(json!({"reply": reply})).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"ok": true}))
}

async fn spawn_service(svc: MockService) -> String {
    let app = Router::new()
        .route("/api/history", get(history))
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .with_state(svc);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

struct Harness {
    page: Document,
    widget: ChatWidget,
    storage: Arc<MemoryStorage>,
}

fn mount_on(base_url: &str, storage: Arc<MemoryStorage>) -> Harness {
    let page = host_page(&DomIds::default());
    let shared: Arc<dyn KeyValueStore> = Arc::<MemoryStorage>::clone(&storage);
    let sessions = SessionManager::new(shared, "stillwave_session_id");
    let backend = Arc::new(HttpBackend::new(base_url).unwrap());
    let widget = ChatWidget::mount(&page, WidgetOptions::default(), sessions, backend).unwrap();
    Harness {
        page,
        widget,
        storage,
    }
}

impl Harness {
    fn element(&self, id: &str) -> Element {
        self.page.get_element_by_id(id).unwrap()
    }

    async fn type_and_submit(&self, text: &str) {
        self.element("chat-input").set_value(text);
        self.page
            .dispatch("chat-form", EventKind::Submit)
            .unwrap()
            .settled()
            .await;
    }

    async fn click(&self, id: &str) {
        self.page
            .dispatch(id, EventKind::Click)
            .unwrap()
            .settled()
            .await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_backend_contract() {
    let svc = MockService::default();
    let base = spawn_service(svc.clone()).await;
    let backend = HttpBackend::new(&base).unwrap();

    assert!(backend.health().await.unwrap().ok);
    assert!(backend.fetch_history("s1").await.unwrap().is_empty());

    let reply = backend.send_message("s1", "Hello").await.unwrap();
    assert_eq!(reply.reply, "Hi there");

    let history = backend.fetch_history("s1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "Hello");
    assert_eq!(history[1].role, "model");
    assert_eq!(history[1].ts.as_deref(), Some("2025-01-01T10:00:01+00:00"));
}

#[tokio::test]
async fn test_http_backend_errors() {
    let svc = MockService::default();
    svc.fail_chat.store(true, Ordering::SeqCst);
    svc.fail_history.store(true, Ordering::SeqCst);
    let backend = HttpBackend::new(spawn_service(svc).await).unwrap();

    match backend.send_message("s1", "Hello").await.unwrap_err() {
        e @ TransportError::Status { status: 502, .. } => {
            assert_eq!(e.detail_message(), "Empty response from model");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    match backend.fetch_history("s1").await.unwrap_err() {
        TransportError::Status { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "database locked");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let offline = HttpBackend::new(dead_url().await).unwrap();
    let err = offline.send_message("s1", "Hello").await.unwrap_err();
    assert!(matches!(err, TransportError::Http(_)));
    assert!(err.status().is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_session_id_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let first = SessionManager::new(Arc::new(FileStorage::open(&path)), "stillwave_session_id");
    let id = first.session_id();
    assert_eq!(first.session_id(), id);

    // A fresh page load reads the same storage.
    let reloaded = SessionManager::new(Arc::new(FileStorage::open(&path)), "stillwave_session_id");
    assert_eq!(reloaded.session_id(), id);

    let parts: Vec<&str> = id.split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0].len(), 4);
    assert_eq!(parts[3].len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_digit() || c == '-'));
}

// ─────────────────────────────────────────────────────────────────────────────
// Widget end to end
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_success_renders_user_then_bot() {
    let base = spawn_service(MockService::default()).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));

    h.click("chat-toggle").await;
    h.type_and_submit("Hello").await;

    assert_eq!(
        h.widget.messages(),
        vec![Message::user("Hello"), Message::bot("Hi there")]
    );
    assert!(!h.element("chat-send").is_disabled());
    assert_eq!(h.element("chat-input").value(), "");
}

#[tokio::test]
async fn test_send_failure_renders_apology() {
    let svc = MockService::default();
    svc.fail_chat.store(true, Ordering::SeqCst);
    let base = spawn_service(svc).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));

    h.type_and_submit("Hello").await;

    assert_eq!(
        h.widget.messages(),
        vec![Message::user("Hello"), Message::bot(DEFAULT_APOLOGY)]
    );
    assert!(!h.element("chat-send").is_disabled());
    assert!(h.page.has_focus(&h.element("chat-input")));
}

#[tokio::test]
async fn test_network_failure_renders_apology() {
    let h = mount_on(&dead_url().await, Arc::new(MemoryStorage::new()));

    h.element("chat-input").set_value("Hello");
    assert_eq!(h.widget.submit().await, SubmitOutcome::Apologized);

    assert_eq!(
        h.widget.messages(),
        vec![Message::user("Hello"), Message::bot(DEFAULT_APOLOGY)]
    );
    assert!(!h.element("chat-send").is_disabled());
}

#[tokio::test]
async fn test_whitespace_submit_is_noop() {
    let base = spawn_service(MockService::default()).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));

    h.type_and_submit("   ").await;

    assert!(h.widget.messages().is_empty());
    assert!(!h.element("chat-send").is_disabled());
    assert_eq!(h.element("chat-input").value(), "   ");
}

#[tokio::test]
async fn test_open_replays_history_replacing_log() {
    let svc = MockService::default();
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("stillwave_session_id", "2025-02-03-040506");
    svc.seed(
        "2025-02-03-040506",
        json!([{"role": "user", "content": "A"}, {"role": "bot", "content": "B"}]),
    );
    let base = spawn_service(svc).await;
    let h = mount_on(&base, storage);

    h.widget
        .render_history(&[Message::user("stale"), Message::bot("stale")]);
    h.click("chat-toggle").await;

    assert_eq!(
        h.widget.messages(),
        vec![Message::user("A"), Message::bot("B")]
    );
    let bubbles = h.element("chat-messages").children();
    assert_eq!(bubbles.len(), 2);
    assert!(bubbles[0].has_class("user"));
    assert!(bubbles[1].has_class("bot"));
}

#[tokio::test]
async fn test_open_with_failing_history_still_opens() {
    let svc = MockService::default();
    svc.fail_history.store(true, Ordering::SeqCst);
    let base = spawn_service(svc).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));

    h.click("chat-toggle").await;

    assert!(h.widget.is_open());
    assert_eq!(
        h.element("chat-toggle").attribute("aria-expanded").as_deref(),
        Some("true")
    );
    assert!(h.page.has_focus(&h.element("chat-input")));
    assert!(h.widget.messages().is_empty());
}

#[tokio::test]
async fn test_conversation_replays_on_next_visit() {
    let base = spawn_service(MockService::default()).await;
    let storage = Arc::new(MemoryStorage::new());

    let first = mount_on(&base, Arc::clone(&storage));
    first.click("chat-toggle").await;
    first.type_and_submit("Hello").await;
    first.type_and_submit("How are you?").await;

    // Same browser storage, new page.
    let second = mount_on(&base, Arc::clone(&first.storage));
    assert_eq!(second.widget.session_id(), first.widget.session_id());
    second.click(LEARN_MORE_ID).await;

    assert_eq!(
        second.widget.messages(),
        vec![
            Message {
                ts: Some("2025-01-01T10:00:00+00:00".to_string()),
                ..Message::user("Hello")
            },
            Message {
                ts: Some("2025-01-01T10:00:01+00:00".to_string()),
                ..Message::bot("Hi there")
            },
            Message {
                ts: Some("2025-01-01T10:00:00+00:00".to_string()),
                ..Message::user("How are you?")
            },
            Message {
                ts: Some("2025-01-01T10:00:01+00:00".to_string()),
                ..Message::bot("You said: How are you?")
            },
        ]
    );
}

#[tokio::test]
async fn test_cleared_storage_starts_new_conversation() {
    let base = spawn_service(MockService::default()).await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set_item("stillwave_session_id", "2000-01-01-000000");

    let first = mount_on(&base, Arc::clone(&storage));
    first.type_and_submit("Hello").await;

    storage.remove_item("stillwave_session_id");
    let second = mount_on(&base, Arc::clone(&storage));
    assert_ne!(second.widget.session_id(), "2000-01-01-000000");

    second.widget.open().wait().await;
    assert!(second.widget.messages().is_empty());
}

#[tokio::test]
async fn test_toggle_twice_returns_closed() {
    let base = spawn_service(MockService::default()).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));
    let toggle = h.element("chat-toggle");

    h.click("chat-toggle").await;
    assert_eq!(toggle.attribute("aria-expanded").as_deref(), Some("true"));
    h.click("chat-toggle").await;
    assert_eq!(toggle.attribute("aria-expanded").as_deref(), Some("false"));
    assert!(h.element("chat-panel").is_hidden());
}

#[tokio::test]
async fn test_learn_more_link_opens_panel() {
    let base = spawn_service(MockService::default()).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));

    let dispatched = h.page.dispatch(LEARN_MORE_ID, EventKind::Click).unwrap();
    assert!(dispatched.default_prevented());
    dispatched.settled().await;

    assert!(h.widget.is_open());
}

#[tokio::test]
async fn test_degraded_page_without_form() {
    let page = Document::new();
    page.body()
        .append_child(Element::new("button").with_id("chat-toggle"));
    page.body().append_child(
        Element::new("div")
            .with_id("chat-panel")
            .with_child(Element::new("div").with_id("chat-messages")),
    );
    let sessions = SessionManager::new(Arc::new(MemoryStorage::new()), "k");
    let backend = Arc::new(HttpBackend::new(dead_url().await).unwrap());
    let widget = ChatWidget::mount(&page, WidgetOptions::default(), sessions, backend).unwrap();

    assert_eq!(widget.submit().await, SubmitOutcome::Ignored);
    widget.open().wait().await;
    assert!(widget.is_open());
    assert!(widget.messages().is_empty());
}

#[test]
fn test_mount_requires_toggle() {
    let page = Document::new();
    page.body().append_child(Element::new("div").with_id("chat-panel"));
    let sessions = SessionManager::new(Arc::new(MemoryStorage::new()), "k");
    let backend = Arc::new(HttpBackend::new("http://127.0.0.1:9").unwrap());

    let err = ChatWidget::mount(&page, WidgetOptions::default(), sessions, backend).unwrap_err();
    assert_eq!(
        err,
        MountError::MissingElement {
            role: "toggle",
            id: "chat-toggle".to_string()
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_submits_send_once() {
    let svc = MockService::default();
    let base = spawn_service(svc.clone()).await;
    let h = mount_on(&base, Arc::new(MemoryStorage::new()));

    h.element("chat-input").set_value("Hello");
    let (a, b) = tokio::join!(h.widget.submit(), h.widget.submit());
    let outcomes = [a, b];

    let replied = outcomes
        .iter()
        .filter(|o| matches!(o, SubmitOutcome::Replied(_)))
        .count();
    assert_eq!(replied, 1);
    let sent: usize = svc.history.lock().unwrap().values().map(Vec::len).sum();
    assert_eq!(sent, 2);
}
