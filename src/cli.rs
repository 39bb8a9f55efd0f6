//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "cocktail-sandbox", version, about = "LLM tool calling over a Weaviate cocktail index")]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Chat configuration to use (a `[chats.<name>]` section)
    #[arg(long, global = true, default_value = "coordinator")]
    pub chat: String,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket chat bridge
    Chat,
    /// Run the HTTP API
    Http,
    /// Run the WebSocket bridge and the HTTP API together
    Serve,
    /// Chat on stdin/stdout
    Console,
    /// Ask one question and print the answer
    Ask {
        /// The question
        text: String,
    },
    /// Manage the cocktail index
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Create the Cocktail class
    Init {
        /// Vectors are supplied by the client (`learn --embed`), not computed by Weaviate
        #[arg(long)]
        no_vectorizer: bool,
    },
    /// Delete the Cocktail class and every stored cocktail
    Clear,
    /// Import cocktails from a CSV file
    Learn {
        #[arg(long, default_value = "data/cocktails.csv")]
        csv: PathBuf,
        #[command(flatten)]
        embed: EmbedArgs,
    },
    /// Semantic search
    Query {
        #[arg(default_value = "Sweet exotic")]
        text: String,
        #[arg(short, long, default_value_t = 3)]
        limit: usize,
        #[command(flatten)]
        embed: EmbedArgs,
    },
    /// Print the recipe for one cocktail
    Recipe {
        name: String,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct EmbedArgs {
    /// Compute vectors with `llm.embedding_model` instead of Weaviate's vectorizer
    #[arg(long)]
    pub embed: bool,
}
