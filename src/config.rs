//! Resolved run-time configuration.
//!
//! `clap` has already merged flags, environment variables and `.env`; this
//! module turns the raw arguments into the values the rest of the crate uses.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::cli::GlobalArgs;
use crate::domain::VariableMeta;
use crate::error::AppError;
use crate::io::meta::load_variable_meta;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Variable metadata CSV; `None` means every variable falls back to its code.
    pub meta_path: Option<PathBuf>,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: &GlobalArgs) -> Result<Self, AppError> {
        if args.timeout_secs == 0 {
            return Err(AppError::new(2, "--timeout-secs must be at least 1"));
        }
        Ok(Self {
            meta_path: args.meta.clone(),
            timeout: Duration::from_secs(args.timeout_secs),
            log_level: args.log_level.clone().filter(|s| !s.trim().is_empty()),
            log_file: args.log_file.clone(),
        })
    }

    /// Load variable metadata. Problems are logged and yield empty metadata:
    /// charts still render, just with code-based labels.
    pub fn load_meta(&self) -> VariableMeta {
        let Some(path) = &self.meta_path else {
            return VariableMeta::empty();
        };
        match load_variable_meta(path) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(error = %err, "ignoring variable metadata");
                VariableMeta::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            meta: None,
            log_level: Some("  ".to_string()),
            log_file: None,
            timeout_secs: 30,
        }
    }

    #[test]
    fn resolves_defaults() {
        let cfg = AppConfig::from_args(&args()).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.log_level.is_none());
        assert!(cfg.load_meta().is_empty());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut a = args();
        a.timeout_secs = 0;
        assert_eq!(AppConfig::from_args(&a).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn broken_meta_file_yields_empty_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "code,description").unwrap();

        let mut a = args();
        a.meta = Some(path);
        let cfg = AppConfig::from_args(&a).unwrap();
        assert!(cfg.load_meta().is_empty());
    }
}
