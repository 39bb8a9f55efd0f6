//! Public configuration structs consumed by the rest of the crate.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::AppError;

/// LLM backend selection and connection settings (`[llm]`).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which backend is active: `"openai"` (any OpenAI-compatible API) or `"dummy"`.
    pub provider: String,
    /// API root, e.g. `http://localhost:11434/v1`. Endpoint paths are appended.
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Model used by `db learn --embed` and `db query --embed`.
    pub embedding_model: String,
    /// How many tool-call rounds a single question may trigger.
    pub max_tool_rounds: usize,
    /// From `OPENAI_API_TOKEN`; never sourced from TOML.
    pub api_key: String,
}

/// Weaviate connection settings (`[weaviate]`).
#[derive(Debug, Clone)]
pub struct WeaviateConfig {
    pub scheme: String,
    /// `host[:port]`, no scheme.
    pub host: String,
    pub timeout_seconds: u64,
}

/// Listener settings shared by the WebSocket and HTTP channels (`[server]`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub ws_port: u16,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn ws_bind(&self) -> String {
        format!("{}:{}", self.host, self.ws_port)
    }

    pub fn http_bind(&self, chat: &ChatConfig) -> String {
        format!("{}:{}", self.host, chat.http_port)
    }
}

/// Optional system prompt sections (`[chats.<name>.prompt]`).
#[derive(Debug, Clone, Default)]
pub struct PromptConfig {
    pub role: Option<String>,
    pub context: Option<String>,
    pub examples: Option<String>,
    pub instructions: Option<String>,
}

/// One named chat persona (`[chats.<name>]`).
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub name: String,
    pub model: String,
    pub temperature: f32,
    /// Used verbatim as the system message when set; otherwise `prompt` is rendered.
    pub system_message: Option<String>,
    pub prompt: PromptConfig,
    /// Function names offered to the model. Built-ins and `[functions]` entries.
    pub available_functions: Vec<String>,
    pub http_port: u16,
}

/// An HTTP-backed function the model can call (`[functions.<name>]`).
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    pub name: String,
    pub url: String,
    pub description: String,
    /// Body template; `{{context}}` and `{{request}}` are substituted.
    pub request_template: String,
    pub context: String,
    pub timeout_seconds: u64,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub llm: LlmConfig,
    pub weaviate: WeaviateConfig,
    pub server: ServerConfig,
    pub chats: HashMap<String, ChatConfig>,
    pub functions: HashMap<String, FunctionConfig>,
}

impl Config {
    /// Look up a chat by name.
    pub fn chat(&self, name: &str) -> Result<&ChatConfig, AppError> {
        self.chats
            .get(name)
            .ok_or_else(|| AppError::Config(format!("configuration for chat \"{name}\" not found")))
    }
}
