//! GraphQL `Get` query construction and response shape.
//!
//! Only the subset the cocktail repository needs: `nearText`, `nearVector`,
//! an `Equal` `where` filter and `limit`. String values are JSON-escaped,
//! which is also valid GraphQL string syntax.

use std::fmt::Write as _;

use serde::Deserialize;

use super::WeaviateError;

#[derive(Debug, Clone, PartialEq)]
struct WhereEqual {
    path: Vec<String>,
    value_text: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Near {
    Text(Vec<String>),
    Vector(Vec<f32>),
}

/// Builder for `{ Get { <Class>(<args>) { <fields> } } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct GetQuery {
    class: String,
    fields: Vec<String>,
    near: Option<Near>,
    filter: Option<WhereEqual>,
    limit: Option<usize>,
}

impl GetQuery {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into(), fields: Vec::new(), near: None, filter: None, limit: None }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn near_text<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.near = Some(Near::Text(concepts.into_iter().map(Into::into).collect()));
        self
    }

    pub fn near_vector(mut self, vector: Vec<f32>) -> Self {
        self.near = Some(Near::Vector(vector));
        self
    }

    pub fn where_equal(mut self, path: &[&str], value_text: impl Into<String>) -> Self {
        self.filter = Some(WhereEqual {
            path: path.iter().map(|p| p.to_string()).collect(),
            value_text: value_text.into(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Render the GraphQL document. Fails when the `nearVector` holds NaN
    /// or an infinity, which GraphQL float literals cannot express.
    pub fn build(&self) -> Result<String, WeaviateError> {
        let mut args: Vec<String> = Vec::new();

        match &self.near {
            Some(Near::Text(concepts)) => {
                args.push(format!("nearText: {{concepts: [{}]}}", quote_all(concepts)));
            }
            Some(Near::Vector(vector)) => {
                check_vector(vector)?;
                let values: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
                args.push(format!("nearVector: {{vector: [{}]}}", values.join(", ")));
            }
            None => {}
        }

        if let Some(f) = &self.filter {
            args.push(format!(
                "where: {{path: [{}], operator: Equal, valueText: {}}}",
                quote_all(&f.path),
                quote(&f.value_text)
            ));
        }

        if let Some(limit) = self.limit {
            args.push(format!("limit: {limit}"));
        }

        let mut query = String::from("{ Get { ");
        query.push_str(&self.class);
        if !args.is_empty() {
            let _ = write!(query, "({})", args.join(", "));
        }
        let _ = write!(query, " {{ {} }} }} }}", self.fields.join(" "));
        Ok(query)
    }
}

/// Reject vectors with NaN or infinite components.
pub fn check_vector(vector: &[f32]) -> Result<(), WeaviateError> {
    match vector.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(WeaviateError::InvalidVector(format!("component {i} is {}", vector[i]))),
        None => Ok(()),
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn quote_all(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
}

// ── Response ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// `POST /v1/graphql` response body.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}
