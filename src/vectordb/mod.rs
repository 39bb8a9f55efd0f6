//! Weaviate REST client.
//!
//! Talks to `{scheme}://{host}/v1` over plain HTTP/JSON: readiness check,
//! schema management, object creation and GraphQL queries. Response bodies
//! are only interpreted as far as the callers need; everything else stays
//! `serde_json::Value`.

pub mod graphql;
pub mod schema;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::WeaviateConfig;

pub use graphql::{GetQuery, GraphQlResponse, check_vector};
pub use schema::{ClassDef, Property};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum WeaviateError {
    #[error("failed to build client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("not ready: {0}")]
    NotReady(String),
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("invalid vector: {0}")]
    InvalidVector(String),
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Cheap to clone; `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct WeaviateClient {
    client: Client,
    base_url: String,
}

impl WeaviateClient {
    pub fn new(config: &WeaviateConfig) -> Result<Self, WeaviateError> {
        Self::with_base_url(
            format!("{}://{}", config.scheme, config.host),
            config.timeout_seconds,
        )
    }

    /// `base_url` is the server root without `/v1`.
    pub fn with_base_url(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self, WeaviateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| WeaviateError::Client(e.to_string()))?;
        let base_url = format!("{}/v1", base_url.into().trim_end_matches('/'));
        Ok(Self { client, base_url })
    }

    /// Build a client and fail early if the server is not ready.
    pub async fn connect(config: &WeaviateConfig) -> Result<Self, WeaviateError> {
        let client = Self::new(config)?;
        client.ready().await?;
        info!(host = %config.host, "weaviate ready");
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// `GET /v1/.well-known/ready`; any non-2xx status means not ready.
    pub async fn ready(&self) -> Result<(), WeaviateError> {
        let response = self
            .client
            .get(self.url(".well-known/ready"))
            .send()
            .await
            .map_err(|e| WeaviateError::NotReady(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(WeaviateError::NotReady(response.status().to_string()))
        }
    }

    /// `POST /v1/schema`
    pub async fn create_class(&self, class: &ClassDef) -> Result<(), WeaviateError> {
        debug!(class = %class.class, "creating class");
        let response = self
            .client
            .post(self.url("schema"))
            .json(class)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// `DELETE /v1/schema/{name}`; also deletes every object of the class.
    pub async fn delete_class(&self, name: &str) -> Result<(), WeaviateError> {
        debug!(class = %name, "deleting class");
        let response = self
            .client
            .delete(self.url(&format!("schema/{name}")))
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// `POST /v1/objects`; returns the id assigned by the server.
    pub async fn create_object(
        &self,
        class: &str,
        properties: Map<String, Value>,
        vector: Option<&[f32]>,
    ) -> Result<String, WeaviateError> {
        let mut body = json!({ "class": class, "properties": properties });
        if let Some(v) = vector {
            check_vector(v)?;
            body["vector"] = json!(v);
        }

        let response = self
            .client
            .post(self.url("objects"))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let created: CreatedObject = response
            .json()
            .await
            .map_err(|e| WeaviateError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    /// `POST /v1/graphql`; GraphQL-level errors are returned in the body, not as `Err`.
    pub async fn graphql(&self, query: &str) -> Result<GraphQlResponse, WeaviateError> {
        debug!(%query, "graphql query");
        let response = self
            .client
            .post(self.url("graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;
        response
            .json::<GraphQlResponse>()
            .await
            .map_err(|e| WeaviateError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    #[serde(default)]
    id: String,
}

fn request_error(e: reqwest::Error) -> WeaviateError {
    error!(error = %e, "weaviate request failed (transport)");
    WeaviateError::Request(e.to_string())
}

// Weaviate reports failures as `{"error": [{"message": "..."}]}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    message: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WeaviateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) if !env.error.is_empty() => env
            .error
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
        _ => body,
    };
    error!(%status, %message, "weaviate returned HTTP error");
    Err(WeaviateError::Status { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> WeaviateClient {
        WeaviateClient::with_base_url(server.uri(), 5).unwrap()
    }

    #[test]
    fn base_url_from_config() {
        let cfg = WeaviateConfig { scheme: "http".into(), host: "weaviate:8080".into(), timeout_seconds: 1 };
        let c = WeaviateClient::new(&cfg).unwrap();
        assert_eq!(c.url("schema"), "http://weaviate:8080/v1/schema");
    }

    #[tokio::test]
    async fn ready_ok_and_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        assert!(client(&server).ready().await.is_ok());

        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&down)
            .await;
        let err = client(&down).ready().await.unwrap_err();
        assert!(matches!(err, WeaviateError::NotReady(_)));
    }

    #[tokio::test]
    async fn create_class_reports_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": [{"message": "class name \"Cocktail\" already exists"}]
            })))
            .mount(&server)
            .await;

        let class = ClassDef {
            class: "Cocktail".into(),
            description: "Alcoholic drink".into(),
            vectorizer: None,
            properties: vec![Property::text("name")],
            module_config: None,
        };
        let err = client(&server).create_class(&class).await.unwrap_err();
        match err {
            WeaviateError::Status { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn delete_class_hits_schema_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/schema/Cocktail"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        client(&server).delete_class("Cocktail").await.unwrap();
    }

    #[tokio::test]
    async fn create_object_sends_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/objects"))
            .and(body_partial_json(json!({
                "class": "Cocktail",
                "properties": {"name": "Cove"},
                "vector": [0.25, 0.5]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc-123"})))
            .mount(&server)
            .await;

        let mut props = Map::new();
        props.insert("name".into(), json!("Cove"));
        let id = client(&server)
            .create_object("Cocktail", props, Some(&[0.25, 0.5]))
            .await
            .unwrap();
        assert_eq!(id, "abc-123");
    }

    #[tokio::test]
    async fn graphql_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(body_partial_json(json!({"query": "{ Get { Cocktail { name } } }"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"Cocktail": [{"name": "Cove"}]}}
            })))
            .mount(&server)
            .await;

        let resp = client(&server).graphql("{ Get { Cocktail { name } } }").await.unwrap();
        assert!(resp.errors.is_empty());
        assert_eq!(resp.data.unwrap()["Get"]["Cocktail"][0]["name"], "Cove");
    }
}
