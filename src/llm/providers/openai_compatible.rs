//! OpenAI-compatible provider (`/chat/completions`, `/embeddings`).
//!
//! All OpenAI wire types are private to this module; callers only see the
//! conversation types from [`crate::llm`]. The provider is stateless: history
//! and the tool-call loop belong to the chat session.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{
    ChatMessage, ChatReply, ChatRequest, FunctionSpec, LlmUsage, ProviderError, Role, ToolCall,
};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP API implementing the OpenAI chat and embeddings endpoints.
///
/// Covers OpenAI itself and local servers (Ollama, LM Studio…). Cheap to
/// clone because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    api_key: String,
}

impl OpenAiCompatibleProvider {
    /// `api_base_url` is the API root (e.g. `http://localhost:11434/v1`);
    /// the key is sent as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: impl Into<String>,
        timeout_seconds: u64,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, api_base_url, api_key: api_key.into() })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base_url)
    }

    /// Lightweight reachability check.
    ///
    /// Any HTTP response (including 4xx) means the server is reachable; only
    /// a transport failure is an error. Uses a hard 5-second timeout.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build ping client: {e}")))?;
        client
            .head(&self.api_base_url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Request(format!("unreachable: {e}")))
    }

    /// One chat-completion round-trip.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        let payload = WireChatRequest::from_request(request);

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            messages = payload.messages.len(),
            tools = payload.tools.len(),
            "sending chat completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let url = self.endpoint("chat/completions");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "LLM HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<WireChatResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received chat completion response");
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&parsed)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(response = %json, "full LLM response payload");
        }

        let usage = parsed.usage.map(|u| LlmUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.into_message())
            .ok_or_else(|| ProviderError::Empty("no choices in chat completion response".into()))?;

        Ok(ChatReply { message, usage })
    }

    /// Embed a single text. An empty `data` array is an error.
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.endpoint("embeddings");
        debug!(%model, text_len = text.len(), "sending embedding request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&WireEmbeddingRequest { model, input: text })
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "embedding HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response
            .json::<WireEmbeddingResponse>()
            .await
            .map_err(|e| ProviderError::Request(format!("failed to parse embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Empty(format!("no embedding for text: {text}")))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

impl WireChatRequest {
    fn from_request(request: &ChatRequest) -> Self {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if request.model.starts_with("gpt-5") {
            None
        } else {
            Some(request.temperature)
        };
        let tools: Vec<WireTool> = request.tools.iter().map(WireTool::from_spec).collect();
        let tool_choice = if tools.is_empty() { None } else { Some("auto") };

        Self {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from_message).collect(),
            temperature,
            tools,
            tool_choice,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    #[serde(default = "default_assistant_role")]
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

fn default_assistant_role() -> String {
    "assistant".to_string()
}

impl WireMessage {
    fn from_message(m: &ChatMessage) -> Self {
        Self {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
            name: m.name.clone(),
            tool_calls: m
                .tool_calls
                .iter()
                .map(|c| WireToolCall {
                    id: c.id.clone(),
                    kind: "function".to_string(),
                    function: WireFunctionCall {
                        name: c.name.clone(),
                        arguments: serde_json::Value::String(c.arguments.clone()),
                    },
                })
                .collect(),
            tool_call_id: m.tool_call_id.clone(),
        }
    }

    fn into_message(self) -> ChatMessage {
        let role = match self.role.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "tool" => Role::Tool,
            _ => Role::Assistant,
        };
        ChatMessage {
            role,
            content: self.content,
            name: self.name,
            tool_calls: self
                .tool_calls
                .into_iter()
                .map(|c| ToolCall {
                    id: c.id,
                    name: c.function.name,
                    arguments: arguments_to_string(c.function.arguments),
                })
                .collect(),
            tool_call_id: self.tool_call_id,
        }
    }
}

/// OpenAI sends arguments as a JSON-encoded string; some compatible servers
/// send the object itself. Normalise both to the string form.
fn arguments_to_string(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "default_function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn default_function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef,
}

impl WireTool {
    fn from_spec(spec: &FunctionSpec) -> Self {
        Self {
            kind: "function",
            function: WireFunctionDef {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireChatResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Serialize)]
struct WireEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireEmbeddingResponse {
    #[serde(default)]
    data: Vec<WireEmbedding>,
}

#[derive(Debug, Deserialize)]
struct WireEmbedding {
    embedding: Vec<f32>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}
