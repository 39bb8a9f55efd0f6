//! Weaviate schema types (`POST /v1/schema` body).

use serde::Serialize;

/// A class (collection) definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDef {
    pub class: String,
    pub description: String,
    /// `None` leaves the server default; `Some("none")` means vectors are supplied by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorizer: Option<String>,
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub data_type: Vec<String>,
}

impl Property {
    pub fn text(name: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: vec!["text".to_string()] }
    }
}
