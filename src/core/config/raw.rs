//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use std::collections::HashMap;

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape; serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub app: RawApp,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub weaviate: RawWeaviate,
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub chats: HashMap<String, RawChat>,
    #[serde(default)]
    pub functions: HashMap<String, RawFunction>,
}

#[derive(Deserialize)]
pub(super) struct RawApp {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawApp {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_file: None }
    }
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_llm_timeout_seconds(),
            embedding_model: default_embedding_model(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

// ── Weaviate ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawWeaviate {
    #[serde(default = "default_weaviate_scheme")]
    pub scheme: String,
    #[serde(default = "default_weaviate_host")]
    pub host: String,
    #[serde(default = "default_weaviate_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawWeaviate {
    fn default() -> Self {
        Self {
            scheme: default_weaviate_scheme(),
            host: default_weaviate_host(),
            timeout_seconds: default_weaviate_timeout_seconds(),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            ws_port: default_ws_port(),
            static_dir: default_static_dir(),
        }
    }
}

// ── Chats ────────────────────────────────────────────────────────────────────

/// One `[chats.<name>]` section.
#[derive(Deserialize)]
pub(super) struct RawChat {
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default)]
    pub prompt: RawPrompt,
    #[serde(default)]
    pub available_functions: Vec<String>,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Deserialize, Default)]
pub(super) struct RawPrompt {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub examples: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

// ── Functions ────────────────────────────────────────────────────────────────

/// One `[functions.<name>]` section; an HTTP-backed tool.
#[derive(Deserialize)]
pub(super) struct RawFunction {
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_request_template")]
    pub request_template: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_function_timeout_seconds")]
    pub timeout_seconds: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_llm_provider() -> String { "openai".to_string() }
pub(super) fn default_api_base_url() -> String { "https://api.openai.com/v1".to_string() }
pub(super) fn default_llm_timeout_seconds() -> u64 { 120 }
pub(super) fn default_embedding_model() -> String { "nomic-embed-text:latest".to_string() }
pub(super) fn default_max_tool_rounds() -> usize { 1 }
pub(super) fn default_weaviate_scheme() -> String { "http".to_string() }
pub(super) fn default_weaviate_host() -> String { "weaviate:8080".to_string() }
pub(super) fn default_weaviate_timeout_seconds() -> u64 { 30 }
pub(super) fn default_server_host() -> String { "0.0.0.0".to_string() }
pub(super) fn default_ws_port() -> u16 { 8000 }
pub(super) fn default_static_dir() -> String { "static".to_string() }
pub(super) fn default_temperature() -> f32 { 0.7 }
pub(super) fn default_http_port() -> u16 { 3000 }
pub(super) fn default_request_template() -> String { "{{request}}".to_string() }
pub(super) fn default_function_timeout_seconds() -> u64 { 180 }
