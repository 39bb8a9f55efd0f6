//! Command handlers behind the CLI.

pub mod db;

use tracing::{debug, info, warn};

use crate::agent::ChatSession;
use crate::agent::functions::FunctionRegistry;
use crate::channels::console::ConsoleChannel;
use crate::channels::http_api::HttpApiChannel;
use crate::channels::ws_chat::WsChatChannel;
use crate::channels::{SharedSession, share};
use crate::cli::Command;
use crate::cocktail::CocktailRepository;
use crate::config::{ChatConfig, Config};
use crate::error::AppError;
use crate::llm::providers;
use crate::runtime::Runtime;
use crate::vectordb::WeaviateClient;

/// Run `command` against the chat named `chat_name`.
pub async fn run(config: &Config, chat_name: &str, command: Command) -> Result<(), AppError> {
    let chat = config.chat(chat_name)?;

    match command {
        Command::Ask { text } => {
            let mut session = new_session(config, chat)?;
            let reply = session.ask(&text).await?;
            println!("{reply}");
            Ok(())
        }
        Command::Db(cmd) => db::run(config, cmd).await,
        Command::Chat => serve(config, chat, true, false, false).await,
        Command::Http => serve(config, chat, false, true, false).await,
        Command::Serve => serve(config, chat, true, true, false).await,
        Command::Console => serve(config, chat, false, false, true).await,
    }
}

/// A fresh session for `chat` with its functions resolved. Weaviate is not
/// contacted until a cocktail function runs.
pub fn new_session(config: &Config, chat: &ChatConfig) -> Result<ChatSession, AppError> {
    let provider = providers::build(&config.llm)?;
    let repository = CocktailRepository::new(WeaviateClient::new(&config.weaviate)?);
    let functions = FunctionRegistry::for_chat(chat, &config.functions, Some(repository))?;
    let session_id = uuid::Uuid::new_v4().to_string();
    Ok(ChatSession::new(session_id, chat, provider, functions, config.llm.max_tool_rounds))
}

/// Start the selected channels and block until shutdown.
///
/// Each channel gets its own session; the WebSocket bridge shares one
/// session across all of its connections.
async fn serve(config: &Config, chat: &ChatConfig, ws: bool, http: bool, console: bool) -> Result<(), AppError> {
    let mut runtime = Runtime::new();
    let session = |config: &Config| -> Result<SharedSession, AppError> { Ok(share(new_session(config, chat)?)) };

    if ws {
        runtime.add(WsChatChannel::new(
            "ws",
            config.server.ws_bind(),
            config.server.static_dir.clone(),
            session(config)?,
        ));
    }
    if http {
        runtime.add(HttpApiChannel::new("http", config.server.http_bind(chat), session(config)?));
    }
    if console {
        runtime.add(ConsoleChannel::new("console", session(config)?));
    }

    match providers::build(&config.llm)?.ping().await {
        Ok(()) => debug!(model = %chat.model, "llm provider reachable"),
        Err(e) => warn!(model = %chat.model, error = %e, "llm provider unreachable"),
    }

    info!(chat = %chat.name, channels = runtime.len(), "starting channels");
    runtime.run().await
}
