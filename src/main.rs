//! Cocktail sandbox entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI
//!   3. Load config (TOML + env overrides)
//!   4. Init logger once (`-v` flags > RUST_LOG > config)
//!   5. Check the selected chat exists
//!   6. Run the command

use clap::Parser;
use tracing::info;

use cocktail_sandbox::cli::Cli;
use cocktail_sandbox::error::AppError;
use cocktail_sandbox::{commands, config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = config::load(&cli.config)?;

    let level_source = logger::init(cli.verbose, &config)?;

    info!(
        config = %cli.config.display(),
        chat = %cli.chat,
        provider = %config.llm.provider,
        configured_log_level = %config.log_level,
        ?level_source,
        "config loaded"
    );

    config.chat(&cli.chat)?;

    commands::run(&config, &cli.chat, cli.command).await
}
