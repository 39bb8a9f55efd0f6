// Library root. The binary entry point is src/main.rs; integration tests
// link against this crate.

mod core;

pub mod agent;
pub mod bootstrap;
pub mod channels;
pub mod cli;
pub mod cocktail;
pub mod commands;
pub mod llm;
pub mod runtime;
pub mod vectordb;

pub use self::bootstrap::logger;
pub use self::core::{config, error};
