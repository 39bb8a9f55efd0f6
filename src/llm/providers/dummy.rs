//! Dummy LLM provider: echoes the last user message back prefixed with `[echo]`.
//! Used for running the channels without a real model and in tests.

use crate::llm::{ChatMessage, ChatReply, ChatRequest, ProviderError, Role};

/// Dimension of the vectors produced by [`DummyProvider::embed`].
pub const DUMMY_EMBEDDING_DIM: usize = 8;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text())
            .unwrap_or("");
        Ok(ChatReply {
            message: ChatMessage::assistant(format!("[echo] {last_user}")),
            usage: None,
        })
    }

    /// Deterministic pseudo-embedding: byte sums bucketed into a fixed-size vector.
    pub async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.is_empty() {
            return Err(ProviderError::Empty("no embedding for empty text".into()));
        }
        let mut v = vec![0f32; DUMMY_EMBEDDING_DIM];
        for (i, b) in text.bytes().enumerate() {
            v[i % DUMMY_EMBEDDING_DIM] += f32::from(b) / 255.0;
        }
        Ok(v)
    }
}
