//! Cocktail repository over the Weaviate client.

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use super::{CLASS_NAME, Cocktail, FIELDS, class_definition};
use crate::vectordb::{GetQuery, GraphQlResponse, WeaviateClient, WeaviateError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Weaviate(#[from] WeaviateError),
    #[error("graphql: {0}")]
    GraphQl(String),
    #[error("no Get field in GQL response")]
    MissingGet,
    #[error("no {0} field in GQL response")]
    MissingClass(String),
    #[error("malformed {CLASS_NAME} object: {0}")]
    Malformed(String),
    #[error("more than one result found for \"{0}\"")]
    Ambiguous(String),
}

#[derive(Debug, Clone)]
pub struct CocktailRepository {
    client: WeaviateClient,
}

impl CocktailRepository {
    pub fn new(client: WeaviateClient) -> Self {
        Self { client }
    }

    /// Create the `Cocktail` class.
    pub async fn init_class(&self, client_vectors: bool) -> Result<(), RepositoryError> {
        self.client.create_class(&class_definition(client_vectors)).await?;
        Ok(())
    }

    /// Drop the `Cocktail` class and all of its objects.
    pub async fn clear_class(&self) -> Result<(), RepositoryError> {
        self.client.delete_class(CLASS_NAME).await?;
        Ok(())
    }

    /// Store one cocktail; returns the object id.
    pub async fn save(&self, cocktail: &Cocktail, vector: Option<&[f32]>) -> Result<String, RepositoryError> {
        let mut props = Map::new();
        props.insert("name".into(), json!(cocktail.name));
        props.insert("ingredients".into(), json!(cocktail.ingredients));
        props.insert("preparation".into(), json!(cocktail.preparation));
        Ok(self.client.create_object(CLASS_NAME, props, vector).await?)
    }

    /// Semantic search over server-side vectors.
    pub async fn list_by_near_text(&self, text: &str, limit: usize) -> Result<Vec<Cocktail>, RepositoryError> {
        let query = GetQuery::new(CLASS_NAME).fields(FIELDS).near_text([text]).limit(limit);
        self.run(&query).await
    }

    /// Semantic search with a vector computed by the caller.
    pub async fn list_by_near_vector(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<Cocktail>, RepositoryError> {
        let query = GetQuery::new(CLASS_NAME).fields(FIELDS).near_vector(vector).limit(limit);
        self.run(&query).await
    }

    /// Exact name lookup. `None` when nothing matches; more than one match is an error.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Cocktail>, RepositoryError> {
        let query = GetQuery::new(CLASS_NAME)
            .fields(FIELDS)
            .where_equal(&["name"], name);
        let mut found = self.run(&query).await?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            _ => Err(RepositoryError::Ambiguous(name.to_string())),
        }
    }

    async fn run(&self, query: &GetQuery) -> Result<Vec<Cocktail>, RepositoryError> {
        let response = self.client.graphql(&query.build()?).await?;
        let cocktails = build_result(response, query.class())?;
        debug!(count = cocktails.len(), "cocktail query returned");
        Ok(cocktails)
    }
}

/// Extract `data.Get.<class>[]` from a GraphQL response.
fn build_result(response: GraphQlResponse, class: &str) -> Result<Vec<Cocktail>, RepositoryError> {
    if !response.errors.is_empty() {
        for e in &response.errors {
            warn!(message = %e.message, "GraphQL error");
        }
        let joined = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RepositoryError::GraphQl(joined));
    }

    let get = response
        .data
        .as_ref()
        .and_then(|d| d.get("Get"))
        .and_then(Value::as_object)
        .ok_or(RepositoryError::MissingGet)?;

    let items = get
        .get(class)
        .and_then(Value::as_array)
        .ok_or_else(|| RepositoryError::MissingClass(class.to_string()))?;

    items
        .iter()
        .map(|item| {
            serde_json::from_value::<Cocktail>(item.clone())
                .map_err(|e| RepositoryError::Malformed(e.to_string()))
        })
        .collect()
}
