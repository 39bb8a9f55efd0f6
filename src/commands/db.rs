//! `db` subcommands: schema management, CSV import and queries.

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::DbCommand;
use crate::cocktail::import::load_csv;
use crate::cocktail::{CLASS_NAME, Cocktail, CocktailRepository};
use crate::config::Config;
use crate::error::AppError;
use crate::llm::{LlmProvider, providers};
use crate::vectordb::WeaviateClient;

/// Embedding source for client-side vectors: provider plus model name.
type Embedder<'a> = Option<(&'a LlmProvider, &'a str)>;

pub async fn run(config: &Config, command: DbCommand) -> Result<(), AppError> {
    let repo = CocktailRepository::new(WeaviateClient::connect(&config.weaviate).await?);

    match command {
        DbCommand::Init { no_vectorizer } => {
            repo.init_class(no_vectorizer).await?;
            println!("Class {CLASS_NAME} created");
        }
        DbCommand::Clear => {
            repo.clear_class().await?;
            println!("Class {CLASS_NAME} deleted");
        }
        DbCommand::Learn { csv, embed } => {
            let cocktails: Vec<Cocktail> = load_csv(&csv)?.into_iter().map(Cocktail::from).collect();
            let provider = embed.embed.then(|| providers::build(&config.llm)).transpose()?;
            let embedder = provider.as_ref().map(|p| (p, config.llm.embedding_model.as_str()));
            let saved = learn(&repo, embedder, &cocktails).await?;
            println!("{saved} cocktails imported from {}", csv.display());
        }
        DbCommand::Query { text, limit, embed } => {
            let provider = embed.embed.then(|| providers::build(&config.llm)).transpose()?;
            let embedder = provider.as_ref().map(|p| (p, config.llm.embedding_model.as_str()));
            let found = query(&repo, embedder, &text, limit).await?;
            print_json(&found)?;
        }
        DbCommand::Recipe { name } => match repo.get_by_name(&name).await? {
            Some(c) => print_json(&c)?,
            None => println!("cocktail \"{name}\" not found"),
        },
    }
    Ok(())
}

/// Save every cocktail, with a vector from `embedder` when given.
/// Returns how many were stored.
pub async fn learn(repo: &CocktailRepository, embedder: Embedder<'_>, cocktails: &[Cocktail]) -> Result<usize, AppError> {
    let mut saved = 0;
    for cocktail in cocktails {
        let vector = match embedder {
            Some((provider, model)) => Some(provider.embed(model, &cocktail.cocktail_text()).await?),
            None => None,
        };
        let id = repo.save(cocktail, vector.as_deref()).await?;
        info!(name = %cocktail.name, %id, "cocktail saved");
        saved += 1;
    }
    if saved == 0 {
        warn!("no cocktails to import");
    }
    Ok(saved)
}

/// Semantic search by text, or by the text's embedding when `embedder` is given.
pub async fn query(
    repo: &CocktailRepository,
    embedder: Embedder<'_>,
    text: &str,
    limit: usize,
) -> Result<Vec<Cocktail>, AppError> {
    let found = match embedder {
        Some((provider, model)) => {
            let vector = provider.embed(model, text).await?;
            repo.list_by_near_vector(vector, limit).await?
        }
        None => repo.list_by_near_text(text, limit).await?,
    };
    Ok(found)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::{DUMMY_EMBEDDING_DIM, DummyProvider};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo(server: &MockServer) -> CocktailRepository {
        CocktailRepository::new(WeaviateClient::with_base_url(server.uri(), 5).unwrap())
    }

    fn cove() -> Cocktail {
        Cocktail { name: "Cove".into(), ingredients: "rum".into(), preparation: "shake".into() }
    }

    #[tokio::test]
    async fn learn_without_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/objects"))
            .and(body_partial_json(json!({"class": "Cocktail", "properties": {"name": "Cove"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(2)
            .mount(&server)
            .await;

        let saved = learn(&repo(&server), None, &[cove(), cove()]).await.unwrap();
        assert_eq!(saved, 2);
        let body: serde_json::Value = serde_json::from_slice(&server.received_requests().await.unwrap()[0].body).unwrap();
        assert!(body.get("vector").is_none());
    }

    #[tokio::test]
    async fn learn_with_embeddings_sends_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/objects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .mount(&server)
            .await;

        let provider = LlmProvider::Dummy(DummyProvider);
        learn(&repo(&server), Some((&provider, "embed")), &[cove()]).await.unwrap();

        let body: serde_json::Value = serde_json::from_slice(&server.received_requests().await.unwrap()[0].body).unwrap();
        assert_eq!(body["vector"].as_array().unwrap().len(), DUMMY_EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn query_by_vector_uses_near_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(body_string_contains("nearVector"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"Cocktail": [{"name": "Cove", "ingredients": "rum", "preparation": "shake"}]}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = LlmProvider::Dummy(DummyProvider);
        let found = query(&repo(&server), Some((&provider, "embed")), "Sweet exotic", 3).await.unwrap();
        assert_eq!(found, vec![cove()]);
    }

    #[tokio::test]
    async fn query_by_text_uses_near_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(body_string_contains("nearText"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"Get": {"Cocktail": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = query(&repo(&server), None, "Sweet exotic", 3).await.unwrap();
        assert!(found.is_empty());
    }
}
