//! Application-wide error types.

use thiserror::Error;

use crate::agent::functions::FunctionError;
use crate::cocktail::RepositoryError;
use crate::llm::ProviderError;
use crate::vectordb::WeaviateError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("llm error: {0}")]
    Llm(#[from] ProviderError),

    #[error("vector db error: {0}")]
    VectorDb(#[from] WeaviateError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("function error: {0}")]
    Function(#[from] FunctionError),

    #[error("import error: {0}")]
    Import(String),

    #[error("server error: {0}")]
    Server(String),
}
