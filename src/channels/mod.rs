//! Channels: the ways a user reaches a chat session.
//!
//! - **ws_chat**: WebSocket bridge plus static chat page (`chat` command).
//! - **http_api**: JSON `POST /api/ask` endpoint (`http` command).
//! - **console**: stdin/stdout loop (`console` command).
//!
//! Every channel implements [`Component`](crate::runtime::Component) and
//! talks to one [`SharedSession`]. Requests to the same session are
//! serialised by its mutex.

pub mod console;
pub mod http_api;
pub mod ws_chat;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agent::ChatSession;

/// A chat session shared by every connection of a channel.
pub type SharedSession = Arc<Mutex<ChatSession>>;

pub fn share(session: ChatSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}
