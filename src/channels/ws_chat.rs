//! WebSocket chat bridge.
//!
//! ```text
//! GET /ws     → WebSocket upgrade; text frames in, text frames out
//! GET /*path  → files from `static_dir` (when the directory exists)
//! GET /       → built-in chat page (when it does not)
//! ```
//!
//! On connect the session's transcript so far is replayed, user lines
//! prefixed with `> `. Origin is not checked.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{Html, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use super::SharedSession;
use crate::error::AppError;
use crate::llm::{ChatMessage, Role};
use crate::runtime::{Component, ComponentFuture};

const BUILTIN_CHAT_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Cocktail sandbox</title>
  <style>
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: #0f0f0f; color: #e0e0e0;
      display: flex; flex-direction: column; height: 100vh;
    }
    #log { flex: 1; overflow-y: auto; padding: 1rem; }
    .msg { margin-bottom: 0.75rem; white-space: pre-wrap; }
    .user { color: #c0c0e0; }
    form { display: flex; border-top: 1px solid #333; background: #1a1a1a; }
    input {
      flex: 1; padding: 0.75rem 1rem; border: none;
      background: transparent; color: inherit; font-size: 1rem;
    }
    button { padding: 0 1.5rem; border: none; background: #2a2a3a; color: #c0c0e0; }
  </style>
</head>
<body>
  <div id="log"></div>
  <form id="form">
    <input id="input" autocomplete="off" placeholder="Ask the bartender…" />
    <button>Send</button>
  </form>
  <script>
    const log = document.getElementById("log");
    const input = document.getElementById("input");
    const ws = new WebSocket((location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/ws");
    function add(text, cls) {
      const div = document.createElement("div");
      div.className = "msg " + cls;
      div.textContent = text;
      log.appendChild(div);
      log.scrollTop = log.scrollHeight;
    }
    ws.onmessage = (e) => add(e.data, e.data.startsWith("> ") ? "user" : "bot");
    ws.onclose = () => add("connection closed", "bot");
    document.getElementById("form").onsubmit = (e) => {
      e.preventDefault();
      if (!input.value) return;
      add("> " + input.value, "user");
      ws.send(input.value);
      input.value = "";
    };
  </script>
</body>
</html>
"#;

#[derive(Clone)]
struct WsState {
    channel_id: Arc<str>,
    session: SharedSession,
}

// ── WsChatChannel ─────────────────────────────────────────────────────────────

pub struct WsChatChannel {
    channel_id: String,
    bind_addr: String,
    static_dir: std::path::PathBuf,
    session: SharedSession,
}

impl WsChatChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bind_addr: impl Into<String>,
        static_dir: impl Into<std::path::PathBuf>,
        session: SharedSession,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            bind_addr: bind_addr.into(),
            static_dir: static_dir.into(),
            session,
        }
    }
}

impl Component for WsChatChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            let router = build_router(&self.channel_id, self.session, &self.static_dir);
            let listener = TcpListener::bind(&self.bind_addr)
                .await
                .map_err(|e| AppError::Server(format!("ws bind failed on {}: {e}", self.bind_addr)))?;

            info!(channel_id = %self.channel_id, bind_addr = %self.bind_addr, "websocket chat listening");

            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .map_err(|e| AppError::Server(format!("ws server error: {e}")))?;

            info!(channel_id = %self.channel_id, "websocket chat shut down");
            Ok(())
        })
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(channel_id: &str, session: SharedSession, static_dir: &Path) -> Router {
    let state = WsState { channel_id: Arc::from(channel_id), session };
    let router = Router::new().route("/ws", get(upgrade)).with_state(state);

    if static_dir.is_dir() {
        info!(dir = %static_dir.display(), "serving static files from disk");
        router.fallback_service(ServeDir::new(static_dir))
    } else {
        info!("no static directory, using built-in chat page");
        router.route("/", get(index))
    }
}

async fn index() -> Html<&'static str> {
    Html(BUILTIN_CHAT_HTML)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<WsState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Transcript line as shown to a reconnecting client.
fn replay_line(message: &ChatMessage) -> String {
    match message.role {
        Role::User => format!("> {}", message.text()),
        _ => message.text().to_string(),
    }
}

async fn handle_socket(mut socket: WebSocket, state: WsState) {
    info!(channel_id = %state.channel_id, "new WebSocket connection");

    let replay: Vec<String> = {
        let session = state.session.lock().await;
        session.transcript().into_iter().map(replay_line).collect()
    };
    for line in replay {
        if socket.send(Message::Text(line.into())).await.is_err() {
            return;
        }
    }

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(t)) => t.as_str().to_string(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(channel_id = %state.channel_id, "chat read error: {e}");
                break;
            }
        };
        debug!(channel_id = %state.channel_id, received = %text, "ws frame");

        let reply = {
            let mut session = state.session.lock().await;
            session.ask(&text).await
        };
        let reply = reply.unwrap_or_else(|e| {
            warn!(channel_id = %state.channel_id, "ask failed: {e}");
            format!("error: {e}")
        });

        if let Err(e) = socket.send(Message::Text(reply.into())).await {
            warn!(channel_id = %state.channel_id, "chat write error: {e}");
            break;
        }
    }
    info!(channel_id = %state.channel_id, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ChatSession;
    use crate::agent::functions::FunctionRegistry;
    use crate::channels::share;
    use crate::config::Config;
    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use futures_util::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    type Client = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    fn session_with(provider: LlmProvider) -> SharedSession {
        let cfg = Config::test_default();
        share(ChatSession::new(
            "ws-test",
            cfg.chat("coordinator").unwrap(),
            provider,
            FunctionRegistry::empty(),
            1,
        ))
    }

    fn session() -> SharedSession {
        session_with(LlmProvider::Dummy(DummyProvider))
    }

    async fn serve(session: SharedSession) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router("ws", session, Path::new("/nonexistent/static"));
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        addr
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await.unwrap();
        client
    }

    async fn next_text(client: &mut Client) -> String {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no frame within 5s")
            .expect("socket closed")
            .unwrap();
        frame.to_text().unwrap().to_string()
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, String) {
        let resp = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn builtin_page_without_static_dir() {
        let router = build_router("ws", session(), Path::new("/nonexistent/static"));
        let (status, body) = fetch(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("new WebSocket("));
    }

    #[tokio::test]
    async fn serves_static_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>custom</p>").unwrap();
        let router = build_router("ws", session(), dir.path());
        let (status, body) = fetch(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<p>custom</p>");
    }

    #[tokio::test]
    async fn ws_requires_upgrade() {
        let router = build_router("ws", session(), Path::new("/nonexistent/static"));
        let (status, _) = fetch(router, "/ws").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn replay_marks_user_lines() {
        let shared = session();
        shared.lock().await.ask("hi").await.unwrap();
        let s = shared.lock().await;
        let lines: Vec<String> = s.transcript().into_iter().map(replay_line).collect();
        assert_eq!(lines, vec!["> hi", "[echo] hi"]);
    }

    #[tokio::test]
    async fn frame_is_answered_over_the_socket() {
        let addr = serve(session()).await;
        let mut client = connect(addr).await;

        client.send(ClientMessage::text("hi")).await.unwrap();
        assert_eq!(next_text(&mut client).await, "[echo] hi");

        client.send(ClientMessage::text("another")).await.unwrap();
        assert_eq!(next_text(&mut client).await, "[echo] another");
    }

    #[tokio::test]
    async fn reconnect_replays_transcript() {
        let shared = session();
        let addr = serve(shared.clone()).await;

        let mut first = connect(addr).await;
        first.send(ClientMessage::text("hi")).await.unwrap();
        assert_eq!(next_text(&mut first).await, "[echo] hi");
        first.close(None).await.unwrap();

        let mut second = connect(addr).await;
        assert_eq!(next_text(&mut second).await, "> hi");
        assert_eq!(next_text(&mut second).await, "[echo] hi");

        second.send(ClientMessage::text("again")).await.unwrap();
        assert_eq!(next_text(&mut second).await, "[echo] again");
        assert_eq!(shared.lock().await.transcript().len(), 4);
    }

    #[tokio::test]
    async fn failed_ask_is_sent_as_error_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let provider = OpenAiCompatibleProvider::new(server.uri(), 5, "k").unwrap();
        let addr = serve(session_with(LlmProvider::OpenAiCompatible(provider))).await;
        let mut client = connect(addr).await;

        client.send(ClientMessage::text("hi")).await.unwrap();
        let reply = next_text(&mut client).await;
        assert!(reply.starts_with("error: "), "{reply}");
        assert!(reply.contains("boom"), "{reply}");
    }
}
