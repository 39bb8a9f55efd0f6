//! Minimal HTTP API for one chat session.
//!
//! ```text
//! GET  /ping      → "pong"
//! POST /api/ask   {"content": "..."} → {"content": "<reply>"}
//! ```
//!
//! Errors are `{"error": "..."}` with 400 (bad body), 500 (ask failed) or
//! 504 (timeout). The content is sent to the session as the TASK section of
//! a prompt.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::SharedSession;
use crate::agent::prompt::PromptBuilder;
use crate::error::AppError;
use crate::runtime::{Component, ComponentFuture};

/// 1 MiB.
pub const MAX_BODY_BYTES: usize = 1 << 20;

pub const ASK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AskRequest {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AskResponse {
    pub content: String,
}

#[derive(Clone)]
struct HttpState {
    channel_id: Arc<str>,
    session: SharedSession,
    ask_timeout: Duration,
}

// ── HttpApiChannel ────────────────────────────────────────────────────────────

pub struct HttpApiChannel {
    channel_id: String,
    bind_addr: String,
    session: SharedSession,
}

impl HttpApiChannel {
    pub fn new(channel_id: impl Into<String>, bind_addr: impl Into<String>, session: SharedSession) -> Self {
        Self { channel_id: channel_id.into(), bind_addr: bind_addr.into(), session }
    }
}

impl Component for HttpApiChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            let router = build_router(&self.channel_id, self.session, ASK_TIMEOUT);
            let listener = TcpListener::bind(&self.bind_addr)
                .await
                .map_err(|e| AppError::Server(format!("http bind failed on {}: {e}", self.bind_addr)))?;

            info!(channel_id = %self.channel_id, bind_addr = %self.bind_addr, "http api listening");

            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .map_err(|e| AppError::Server(format!("http server error: {e}")))?;

            info!(channel_id = %self.channel_id, "http api shut down");
            Ok(())
        })
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(channel_id: &str, session: SharedSession, ask_timeout: Duration) -> Router {
    let state = HttpState { channel_id: Arc::from(channel_id), session, ask_timeout };
    Router::new()
        .route("/ping", get(ping))
        .route("/api/ask", post(ask))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn json_error(status: StatusCode, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": msg.to_string() }))).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /ping
async fn ping() -> &'static str {
    "pong"
}

/// POST /api/ask
async fn ask(State(state): State<HttpState>, body: Bytes) -> Response {
    let req: AskRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, format!("invalid JSON: {e}")),
    };
    if req.content.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "content is required");
    }

    let prompt = PromptBuilder::new().task(req.content).build();

    // The ask runs to completion in its own task; a timeout only stops
    // waiting for it, so the session never ends halfway through a tool round.
    let session = state.session.clone();
    let asked = tokio::spawn(async move {
        let mut session = session.lock().await;
        session.ask(&prompt).await
    });

    match tokio::time::timeout(state.ask_timeout, asked).await {
        Ok(Ok(Ok(content))) => (StatusCode::OK, Json(AskResponse { content })).into_response(),
        Ok(Ok(Err(e))) => {
            warn!(channel_id = %state.channel_id, "ask failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
        Ok(Err(e)) => {
            error!(channel_id = %state.channel_id, "ask task failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "ask task failed")
        }
        Err(_) => {
            warn!(channel_id = %state.channel_id, "ask timed out; answer will only be kept in history");
            json_error(StatusCode::GATEWAY_TIMEOUT, "AI request timed out")
        }
    }
}
