//! Configuration loading with env-var overrides.
//!
//! Reads a TOML file (default `config/default.toml`), then applies
//! `OPENAI_URL`, `OPENAI_API_TOKEN` and `SANDBOX_LOG_LEVEL` overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `ChatConfig`, …).
//! - **raw**: Raw TOML deserialization types; kept private.
//! - **load**: Loading logic: `load`, `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{DEFAULT_API_TOKEN, Overrides, expand_home, load, load_from};
pub use types::*;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests; dummy LLM, one `coordinator` chat, no external calls.
    pub fn test_default() -> Self {
        let chat = ChatConfig {
            name: "coordinator".into(),
            model: "test-model".into(),
            temperature: 0.0,
            system_message: Some("You are a test bartender.".into()),
            prompt: PromptConfig::default(),
            available_functions: vec![],
            http_port: 0,
        };
        Self {
            log_level: "info".into(),
            log_file: None,
            llm: LlmConfig {
                provider: "dummy".into(),
                api_base_url: "http://localhost:0/v1".into(),
                timeout_seconds: 1,
                embedding_model: "test-embed".into(),
                max_tool_rounds: 1,
                api_key: DEFAULT_API_TOKEN.into(),
            },
            weaviate: WeaviateConfig {
                scheme: "http".into(),
                host: "localhost:0".into(),
                timeout_seconds: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                ws_port: 0,
                static_dir: std::path::PathBuf::from("/nonexistent/static"),
            },
            chats: std::collections::HashMap::from([("coordinator".to_string(), chat)]),
            functions: std::collections::HashMap::new(),
        }
    }
}
