//! Configuration loading with env-var overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;
use crate::logger::parse_level;

use super::raw::RawConfig;
use super::types::*;

/// Default API key sent when `OPENAI_API_TOKEN` is not set. Local
/// OpenAI-compatible servers accept any bearer token.
pub const DEFAULT_API_TOKEN: &str = "DefaultToken";

/// Values that override the TOML file. Populated from the environment by
/// [`load`]; tests build it directly instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `OPENAI_URL`
    pub api_base_url: Option<String>,
    /// `OPENAI_API_TOKEN`
    pub api_key: Option<String>,
    /// `SANDBOX_LOG_LEVEL`
    pub log_level: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            api_base_url: non_empty("OPENAI_URL"),
            api_key: non_empty("OPENAI_API_TOKEN"),
            log_level: non_empty("SANDBOX_LOG_LEVEL"),
        }
    }
}

/// Load config from `path`, then apply env-var overrides.
pub fn load(path: &Path) -> Result<Config, AppError> {
    load_from(path, Overrides::from_env())
}

/// Internal loader; accepts an explicit path and overrides.
pub fn load_from(path: &Path, overrides: Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    debug!(path = %path.display(), chats = parsed.chats.len(), functions = parsed.functions.len(), "config file parsed");

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: Overrides) -> Result<Config, AppError> {
    if parsed.llm.max_tool_rounds == 0 {
        return Err(AppError::Config("llm.max_tool_rounds must be at least 1".into()));
    }

    let log_level = overrides.log_level.unwrap_or(parsed.app.log_level);
    parse_level(&log_level).map_err(|e| AppError::Config(format!("app.log_level: {e}")))?;

    let chats = parsed
        .chats
        .into_iter()
        .map(|(name, c)| {
            let chat = ChatConfig {
                name: name.clone(),
                model: c.model,
                temperature: c.temperature,
                system_message: c.system_message,
                prompt: PromptConfig {
                    role: c.prompt.role,
                    context: c.prompt.context,
                    examples: c.prompt.examples,
                    instructions: c.prompt.instructions,
                },
                available_functions: c.available_functions,
                http_port: c.http_port,
            };
            (name, chat)
        })
        .collect();

    let functions = parsed
        .functions
        .into_iter()
        .map(|(name, f)| {
            let function = FunctionConfig {
                name: name.clone(),
                url: f.url,
                description: f.description,
                request_template: f.request_template,
                context: f.context,
                timeout_seconds: f.timeout_seconds,
            };
            (name, function)
        })
        .collect();

    Ok(Config {
        log_level,
        log_file: parsed.app.log_file.as_deref().map(expand_home),
        llm: LlmConfig {
            provider: parsed.llm.provider,
            api_base_url: overrides.api_base_url.unwrap_or(parsed.llm.api_base_url),
            timeout_seconds: parsed.llm.timeout_seconds,
            embedding_model: parsed.llm.embedding_model,
            max_tool_rounds: parsed.llm.max_tool_rounds,
            api_key: overrides.api_key.unwrap_or_else(|| DEFAULT_API_TOKEN.to_string()),
        },
        weaviate: WeaviateConfig {
            scheme: parsed.weaviate.scheme,
            host: parsed.weaviate.host,
            timeout_seconds: parsed.weaviate.timeout_seconds,
        },
        server: ServerConfig {
            host: parsed.server.host,
            ws_port: parsed.server.ws_port,
            static_dir: expand_home(&parsed.server.static_dir),
        },
        chats,
        functions,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
