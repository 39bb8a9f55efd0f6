//! HTTP-backed functions declared under `[functions.<name>]`.
//!
//! The model passes a single `request` string. It is rendered into the
//! function's `request_template` together with the configured `context`,
//! then POSTed as `{"content": "<rendered>"}`. The raw response body is the
//! function result.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{FunctionError, string_arg};
use crate::agent::prompt::render_template;
use crate::config::FunctionConfig;
use crate::llm::FunctionSpec;

pub const CORRELATION_HEADER: &str = "X-correlationId";

#[derive(Serialize)]
struct RemoteRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Clone)]
pub struct RemoteFunction {
    config: FunctionConfig,
    client: Client,
}

impl RemoteFunction {
    pub fn new(config: FunctionConfig) -> Result<Self, FunctionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FunctionError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "request": { "type": "string", "description": "Request from user" }
                },
                "required": ["request"]
            }),
        }
    }

    /// Body sent for `request`, before JSON wrapping.
    pub fn render(&self, request: &str) -> String {
        let vars = HashMap::from([
            ("context", self.config.context.as_str()),
            ("request", request),
        ]);
        render_template(&self.config.request_template, &vars)
    }

    pub async fn call(&self, args: &Value, session_id: &str) -> Result<String, FunctionError> {
        let request = string_arg(self.name(), args, "request")?;
        let content = self.render(request);

        info!(function = %self.config.name, url = %self.config.url, "calling remote function");
        let response = self
            .client
            .post(&self.config.url)
            .header(CORRELATION_HEADER, session_id)
            .json(&RemoteRequest { content: &content })
            .send()
            .await
            .map_err(|e| FunctionError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FunctionError::Request(e.to_string()))?;
        debug!(function = %self.config.name, %status, %body, "remote function response");

        if !status.is_success() {
            warn!(function = %self.config.name, %status, "remote function returned HTTP error");
            return Err(FunctionError::Status { status: status.as_u16(), body });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn function(url: String) -> RemoteFunction {
        RemoteFunction::new(FunctionConfig {
            name: "sommelier".into(),
            url,
            description: "Ask the sommelier".into(),
            request_template: "{{context}}Request: {{request}}".into(),
            context: "The user is a gourmet\n".into(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn spec_has_single_required_request() {
        let spec = function("http://localhost".into()).spec();
        assert_eq!(spec.name, "sommelier");
        assert_eq!(spec.parameters["required"], json!(["request"]));
        assert_eq!(spec.parameters["properties"]["request"]["type"], "string");
    }

    #[test]
    fn render_substitutes_context_and_request() {
        let f = function("http://localhost".into());
        assert_eq!(f.render("red wine"), "The user is a gourmet\nRequest: red wine");
    }

    #[test]
    fn render_keeps_placeholders_from_the_model() {
        let f = function("http://localhost".into());
        assert_eq!(
            f.render("tell me {{context}}"),
            "The user is a gourmet\nRequest: tell me {{context}}"
        );
    }

    #[tokio::test]
    async fn call_posts_content_with_correlation_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(header("X-correlationId", "session-42"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"content": "The user is a gourmet\nRequest: red wine"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("Try a Barolo."))
            .expect(1)
            .mount(&server)
            .await;

        let f = function(format!("{}/ask", server.uri()));
        let out = f.call(&json!({"request": "red wine"}), "session-42").await.unwrap();
        assert_eq!(out, "Try a Barolo.");
    }

    #[tokio::test]
    async fn non_success_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let f = function(server.uri());
        let err = f.call(&json!({"request": "x"}), "s").await.unwrap_err();
        assert!(matches!(err, FunctionError::Status { status: 503, ref body } if body == "busy"));
    }

    #[tokio::test]
    async fn missing_request_argument() {
        let f = function("http://localhost".into());
        let err = f.call(&json!({"query": "x"}), "s").await.unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArguments { .. }));
    }
}
