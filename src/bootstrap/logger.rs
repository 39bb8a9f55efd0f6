//! Logging setup for the sandbox.
//!
//! The filter is picked once at startup, first match wins:
//!
//! 1. `-v` flags (`-v` warn, `-vv` info, `-vvv` debug, `-vvvv` trace)
//! 2. `RUST_LOG`, when set and valid
//! 3. `app.log_level`, which `SANDBOX_LOG_LEVEL` already overrode during
//!    config loading
//!
//! Output goes to stderr, or is appended to `app.log_file` without colours.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::Config;
use crate::error::AppError;

/// Which setting produced the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    Verbosity,
    RustLog,
    Config,
}

/// Install the global subscriber for `config`, honouring `verbosity`
/// (the number of `-v` flags). Returns where the filter came from.
pub fn init(verbosity: u8, config: &Config) -> Result<LevelSource, AppError> {
    let rust_log = std::env::var("RUST_LOG").ok().filter(|v| !v.is_empty());
    let (filter, source) = select_filter(verbosity, &config.log_level, rust_log.as_deref())?;
    let log_file = config.log_file.as_deref();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer(log_file)?)
        .with_ansi(log_file.is_none())
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(source)
}

fn select_filter(
    verbosity: u8,
    configured: &str,
    rust_log: Option<&str>,
) -> Result<(EnvFilter, LevelSource), AppError> {
    if let Some(level) = level_for_verbosity(verbosity) {
        let filter = EnvFilter::try_new(level).map_err(|e| AppError::Logger(e.to_string()))?;
        return Ok((filter, LevelSource::Verbosity));
    }
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok((filter, LevelSource::RustLog));
    }
    EnvFilter::try_new(configured)
        .map(|filter| (filter, LevelSource::Config))
        .map_err(|e| AppError::Logger(format!("invalid log level '{configured}': {e}")))
}

fn make_writer(log_file: Option<&Path>) -> Result<BoxMakeWriter, AppError> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logger(format!("failed to open log file '{}': {e}", path.display())))?;
    Ok(BoxMakeWriter::new(file))
}

/// Validate a plain level name (`error` … `trace`).
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

/// Level forced by `verbosity` `-v` flags; `None` when there are none.
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        for l in ["error", "warn", "info", "debug", "trace"] {
            assert!(parse_level(l).is_ok(), "{l}");
        }
        assert!(parse_level("loud").is_err());
        assert!(parse_level("").is_err());
    }

    #[test]
    fn verbosity_tiers() {
        assert_eq!(level_for_verbosity(0), None);
        assert_eq!(level_for_verbosity(1), Some("warn"));
        assert_eq!(level_for_verbosity(3), Some("debug"));
        assert_eq!(level_for_verbosity(9), Some("trace"));
    }

    #[test]
    fn verbosity_beats_rust_log_and_config() {
        let (filter, source) = select_filter(3, "info", Some("error")).unwrap();
        assert_eq!(source, LevelSource::Verbosity);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn rust_log_beats_config() {
        let (filter, source) = select_filter(0, "info", Some("trace")).unwrap();
        assert_eq!(source, LevelSource::RustLog);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn config_level_without_overrides() {
        let (filter, source) = select_filter(0, "warn", None).unwrap();
        assert_eq!(source, LevelSource::Config);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sandbox.log");
        make_writer(Some(&path)).unwrap();
        assert!(path.exists());
        assert!(make_writer(Some(&dir.path().join("missing/x.log"))).is_err());
    }
}
