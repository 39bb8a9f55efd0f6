//! Chat session: conversation history plus the tool-calling loop.
//!
//! A session starts with one system message. Each [`ChatSession::ask`]
//! appends the user message, sends the whole history to the provider and
//! handles tool calls in the reply:
//!
//! ```text
//! user ─▶ LLM ─▶ assistant (tool_calls?) ─▶ run tools ─▶ tool results ─▶ LLM ─▶ …
//! ```
//!
//! Tools are offered while fewer than `max_tool_rounds` rounds have run. The
//! follow-up after the last round goes out without tools, so the model has
//! to answer in text.

pub mod functions;
pub mod prompt;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, LlmUsage, ProviderError, Role};

use functions::FunctionRegistry;
use prompt::PromptBuilder;

#[derive(Debug)]
pub struct ChatSession {
    session_id: String,
    model: String,
    temperature: f32,
    provider: LlmProvider,
    functions: FunctionRegistry,
    max_tool_rounds: usize,
    history: Vec<ChatMessage>,
    usage: LlmUsage,
}

impl ChatSession {
    pub fn new(
        session_id: impl Into<String>,
        chat: &ChatConfig,
        provider: LlmProvider,
        functions: FunctionRegistry,
        max_tool_rounds: usize,
    ) -> Self {
        let session_id = session_id.into();
        let system = system_message(chat);
        info!(%session_id, chat = %chat.name, functions = ?functions.names(), "new session started");
        Self {
            session_id,
            model: chat.model.clone(),
            temperature: chat.temperature,
            provider,
            functions,
            max_tool_rounds,
            history: vec![ChatMessage::system(system)],
            usage: LlmUsage::default(),
        }
    }

    /// Every message so far, system message first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// User and assistant messages that carry text, in order.
    pub fn transcript(&self) -> Vec<&ChatMessage> {
        self.history
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .filter(|m| !m.has_tool_calls() && !m.text().is_empty())
            .collect()
    }

    /// Token totals across all requests of this session.
    pub fn usage(&self) -> &LlmUsage {
        &self.usage
    }

    /// Send `input` and return the final assistant text (empty when the model
    /// sent none). On a provider error the history up to the failure is kept.
    pub async fn ask(&mut self, input: &str) -> Result<String, ProviderError> {
        debug!(session_id = %self.session_id, %input, "sending request to LLM");
        self.history.push(ChatMessage::user(input));

        let mut rounds = 0;
        loop {
            let offer_tools = !self.functions.is_empty() && rounds < self.max_tool_rounds;
            let request = ChatRequest {
                model: self.model.clone(),
                temperature: self.temperature,
                messages: self.history.clone(),
                tools: if offer_tools { self.functions.specs() } else { Vec::new() },
            };

            let reply = self.provider.chat(&request).await?;
            if let Some(u) = &reply.usage {
                self.usage.input_tokens += u.input_tokens;
                self.usage.output_tokens += u.output_tokens;
            }

            let mut message = reply.message;
            if message.has_tool_calls() && !offer_tools {
                // An unanswered tool call would poison every later request.
                warn!(session_id = %self.session_id, "tool calls returned without tools offered; ignored");
                message.tool_calls.clear();
            }

            if !message.has_tool_calls() {
                let text = message.text().to_string();
                debug!(session_id = %self.session_id, reply = %text, "response from LLM");
                self.history.push(message);
                return Ok(text);
            }

            rounds += 1;
            let calls = message.tool_calls.clone();
            self.history.push(message);
            for call in &calls {
                info!(session_id = %self.session_id, function = %call.name, arguments = %call.arguments, "call function");
                let content = match self.functions.call(call, &self.session_id).await {
                    Ok(result) => {
                        debug!(function = %call.name, %result, "function result");
                        result
                    }
                    Err(e) => {
                        warn!(function = %call.name, error = %e, "function failed");
                        json!({ "error": e.to_string() }).to_string()
                    }
                };
                self.history.push(ChatMessage::tool_result(call, content));
            }
            debug!(session_id = %self.session_id, round = rounds, "sending tool results to LLM");
        }
    }
}

/// `system_message` verbatim, or the chat's prompt sections rendered.
fn system_message(chat: &ChatConfig) -> String {
    match &chat.system_message {
        Some(s) if !s.is_empty() => s.clone(),
        _ => PromptBuilder::from_config(&chat.prompt).build(),
    }
}
