//! Functions the model may call during a chat.
//!
//! Two kinds exist: [`Builtin`] functions implemented in-process and
//! [`RemoteFunction`]s backed by an HTTP endpoint from `[functions.<name>]`.
//! A [`FunctionRegistry`] holds the subset a chat lists in
//! `available_functions`; a built-in wins over a remote function of the same
//! name.

pub mod builtin;
pub mod remote;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cocktail::{CocktailRepository, RepositoryError};
use crate::config::{ChatConfig, FunctionConfig};
use crate::llm::{FunctionSpec, ToolCall};

pub use builtin::Builtin;
pub use remote::RemoteFunction;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("unknown function name: {0}")]
    Unknown(String),
    #[error("invalid arguments for {name}: {message}")]
    InvalidArguments { name: String, message: String },
    #[error("{0} needs the vector database, which is not configured")]
    Unavailable(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Parse the JSON-encoded argument object of a tool call. An empty string
/// counts as `{}`; any other non-object value is rejected.
pub fn parse_arguments(name: &str, raw: &str) -> Result<Value, FunctionError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let invalid = |message: String| FunctionError::InvalidArguments { name: name.to_string(), message };
    match serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))? {
        Value::Object(map) => Ok(Value::Object(map)),
        _ => Err(invalid("arguments must be a JSON object".to_string())),
    }
}

/// Required string argument `key`.
pub(crate) fn string_arg<'a>(name: &str, args: &'a Value, key: &str) -> Result<&'a str, FunctionError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FunctionError::InvalidArguments {
            name: name.to_string(),
            message: format!("missing string argument \"{key}\""),
        })
}

// ── Function ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Function {
    Builtin(Builtin),
    Remote(RemoteFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Builtin(b) => b.name(),
            Function::Remote(r) => r.name(),
        }
    }

    pub fn spec(&self) -> FunctionSpec {
        match self {
            Function::Builtin(b) => b.spec(),
            Function::Remote(r) => r.spec(),
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<Function>,
    repository: Option<CocktailRepository>,
}

impl FunctionRegistry {
    /// No functions; requests are sent without tools.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve `chat.available_functions` against the built-ins and `remote`.
    /// Names defined nowhere are logged and skipped.
    pub fn for_chat(
        chat: &ChatConfig,
        remote: &HashMap<String, FunctionConfig>,
        repository: Option<CocktailRepository>,
    ) -> Result<Self, FunctionError> {
        let mut functions = Vec::new();
        for name in &chat.available_functions {
            if functions.iter().any(|f: &Function| f.name() == name) {
                continue;
            }
            if let Some(b) = Builtin::from_name(name) {
                if b.needs_repository() && repository.is_none() {
                    warn!(function = %name, "function needs the vector database; not offered");
                    continue;
                }
                info!(function = %name, "available function");
                functions.push(Function::Builtin(b));
            } else if let Some(cfg) = remote.get(name) {
                info!(function = %name, url = %cfg.url, "API based function");
                functions.push(Function::Remote(RemoteFunction::new(cfg.clone())?));
            } else {
                warn!(chat = %chat.name, function = %name, "function listed but not defined");
            }
        }
        Ok(Self { functions, repository })
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(Function::name).collect()
    }

    pub fn specs(&self) -> Vec<FunctionSpec> {
        self.functions.iter().map(Function::spec).collect()
    }

    /// Run the function a tool call names.
    pub async fn call(&self, call: &ToolCall, session_id: &str) -> Result<String, FunctionError> {
        let function = self
            .functions
            .iter()
            .find(|f| f.name() == call.name)
            .ok_or_else(|| FunctionError::Unknown(call.name.clone()))?;

        let args = parse_arguments(&call.name, &call.arguments)?;
        debug!(function = %call.name, arguments = %call.arguments, "calling function");

        match function {
            Function::Builtin(b) => b.call(&args, self.repository.as_ref()).await,
            Function::Remote(r) => r.call(&args, session_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::vectordb::WeaviateClient;

    fn chat_with(functions: &[&str]) -> ChatConfig {
        let mut chat = Config::test_default().chat("coordinator").unwrap().clone();
        chat.available_functions = functions.iter().map(|s| s.to_string()).collect();
        chat
    }

    fn remote(name: &str) -> FunctionConfig {
        FunctionConfig {
            name: name.into(),
            url: "http://localhost:9/fn".into(),
            description: "remote".into(),
            request_template: "{{request}}".into(),
            context: String::new(),
            timeout_seconds: 1,
        }
    }

    fn repo() -> CocktailRepository {
        CocktailRepository::new(WeaviateClient::with_base_url("http://localhost:9", 1).unwrap())
    }

    #[test]
    fn only_listed_functions_offered() {
        let chat = chat_with(&["get_current_time", "sommelier"]);
        let remotes = HashMap::from([
            ("sommelier".to_string(), remote("sommelier")),
            ("unused".to_string(), remote("unused")),
        ]);
        let reg = FunctionRegistry::for_chat(&chat, &remotes, None).unwrap();
        assert_eq!(reg.names(), vec!["get_current_time", "sommelier"]);
        assert_eq!(reg.specs().len(), 2);
    }

    #[test]
    fn builtin_shadows_remote() {
        let chat = chat_with(&["get_current_weather"]);
        let remotes = HashMap::from([("get_current_weather".to_string(), remote("get_current_weather"))]);
        let reg = FunctionRegistry::for_chat(&chat, &remotes, None).unwrap();
        assert!(matches!(reg.functions[0], Function::Builtin(Builtin::CurrentWeather)));
    }

    #[test]
    fn undefined_and_duplicate_names_skipped() {
        let chat = chat_with(&["nope", "get_current_time", "get_current_time"]);
        let reg = FunctionRegistry::for_chat(&chat, &HashMap::new(), None).unwrap();
        assert_eq!(reg.names(), vec!["get_current_time"]);
    }

    #[test]
    fn cocktail_functions_need_repository() {
        let chat = chat_with(&["cocktail_list", "cocktail_recipe"]);
        let without = FunctionRegistry::for_chat(&chat, &HashMap::new(), None).unwrap();
        assert!(without.is_empty());
        let with = FunctionRegistry::for_chat(&chat, &HashMap::new(), Some(repo())).unwrap();
        assert_eq!(with.names(), vec!["cocktail_list", "cocktail_recipe"]);
    }

    #[tokio::test]
    async fn unknown_call_errors() {
        let reg = FunctionRegistry::empty();
        let call = ToolCall { id: "c1".into(), name: "get_current_time".into(), arguments: "{}".into() };
        let err = reg.call(&call, "s").await.unwrap_err();
        assert!(matches!(err, FunctionError::Unknown(n) if n == "get_current_time"));
    }

    #[tokio::test]
    async fn malformed_arguments_error() {
        let reg = FunctionRegistry::for_chat(&chat_with(&["get_current_weather"]), &HashMap::new(), None).unwrap();
        let call = ToolCall { id: "c1".into(), name: "get_current_weather".into(), arguments: "{not json".into() };
        assert!(matches!(reg.call(&call, "s").await, Err(FunctionError::InvalidArguments { .. })));
    }

    #[test]
    fn empty_arguments_are_an_object() {
        assert_eq!(parse_arguments("f", "  ").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn non_object_arguments_rejected() {
        for raw in ["[1]", "\"x\"", "42", "null"] {
            let err = parse_arguments("get_current_time", raw).unwrap_err();
            assert!(err.to_string().contains("must be a JSON object"), "{raw}: {err}");
        }
    }

    #[tokio::test]
    async fn weather_without_location_is_invalid() {
        let reg = FunctionRegistry::for_chat(&chat_with(&["get_current_weather"]), &HashMap::new(), None).unwrap();
        let call = ToolCall { id: "c1".into(), name: "get_current_weather".into(), arguments: "{}".into() };
        let err = reg.call(&call, "s").await.unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArguments { ref message, .. } if message.contains("location")));
    }
}
