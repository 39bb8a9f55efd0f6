use std::path::{Path, PathBuf};

use cocktail_sandbox::cocktail::import::load_csv;
use cocktail_sandbox::commands::new_session;
use cocktail_sandbox::config::{Overrides, load_from};

fn manifest_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(rel)
}

#[test]
fn shipped_config_parses() {
    let cfg = load_from(&manifest_path("config/default.toml"), Overrides::default()).unwrap();

    assert_eq!(cfg.llm.provider, "openai");
    assert_eq!(cfg.llm.max_tool_rounds, 1);
    assert_eq!(cfg.server.ws_port, 8000);

    let coordinator = cfg.chat("coordinator").unwrap();
    assert!(coordinator.available_functions.iter().any(|f| f == "cocktail_recipe"));
    assert!(coordinator.system_message.is_none());
    assert!(coordinator.prompt.role.is_some());

    let sommelier = &cfg.functions["sommelier"];
    assert!(sommelier.request_template.contains("{{request}}"));
    assert_eq!(sommelier.timeout_seconds, 180);
}

#[test]
fn env_overrides_win_over_file() {
    let overrides = Overrides {
        api_base_url: Some("http://llm.local/v1".into()),
        api_key: Some("secret".into()),
        log_level: Some("debug".into()),
    };
    let cfg = load_from(&manifest_path("config/default.toml"), overrides).unwrap();
    assert_eq!(cfg.llm.api_base_url, "http://llm.local/v1");
    assert_eq!(cfg.llm.api_key, "secret");
    assert_eq!(cfg.log_level, "debug");
}

#[test]
fn sample_csv_is_readable() {
    let rows = load_csv(&manifest_path("data/cocktails.csv")).unwrap();
    assert!(rows.len() >= 5);
    assert!(rows.iter().any(|r| r.name == "Cove"));
    assert!(rows.iter().all(|r| !r.ingredients.is_empty()));
}

#[tokio::test]
async fn coordinator_session_with_dummy_provider() {
    let mut cfg = load_from(&manifest_path("config/default.toml"), Overrides::default()).unwrap();
    cfg.llm.provider = "dummy".into();

    let chat = cfg.chat("coordinator").unwrap().clone();
    let mut session = new_session(&cfg, &chat).unwrap();
    assert!(session.history()[0].text().starts_with("[ROLE]\n"));
    assert_eq!(session.ask("Something with rum").await.unwrap(), "[echo] Something with rum");
}
