//! `tracing` subscriber set-up.
//!
//! The filter comes from `--log-level` / `HKS_LOG`, then `RUST_LOG`, then
//! [`DEFAULT_FILTER`]. Output goes to the log file when one is configured,
//! otherwise to stderr, except in the TUI where stderr would draw over the
//! alternate screen and events are dropped instead.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::AppError;

pub const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Cli,
    Tui,
}

pub fn build_filter(level: Option<&str>) -> Result<EnvFilter, AppError> {
    match level {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| AppError::new(2, format!("Invalid log filter '{directives}': {e}"))),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber. Call once, before any fetch.
pub fn init(config: &AppConfig, output: Output) -> Result<(), AppError> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(config.log_level.as_deref())?);

    let installed = match (&config.log_file, output) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open log file {}: {e}", path.display())))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        (None, Output::Cli) => builder.with_writer(std::io::stderr).try_init(),
        (None, Output::Tui) => builder.with_writer(std::io::sink).try_init(),
    };
    installed.map_err(|e| AppError::new(2, format!("Failed to initialise logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_is_parsed() {
        assert!(build_filter(Some("hkma_series=debug,warn")).is_ok());
        assert!(build_filter(None).is_ok());
    }

    #[test]
    fn malformed_filter_is_a_usage_error() {
        let err = build_filter(Some("hkma_series=loud")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
