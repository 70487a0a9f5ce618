//! Command-line parsing for the HKMA series tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from fetching, normalization and charting.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};

use crate::domain::SourceId;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hks", version, about = "HKMA statistics fetcher and dual-axis plotter")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Variable metadata CSV (columns: variable, label, unit).
    #[arg(long, global = true, env = "HKS_META", value_name = "CSV")]
    pub meta: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `hkma_series=trace` (falls back to RUST_LOG).
    #[arg(long, global = true, env = "HKS_LOG", value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Append logs to this file (the TUI logs nowhere otherwise).
    #[arg(long, global = true, env = "HKS_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// HTTP timeout per page request, in seconds.
    #[arg(long, global = true, env = "HKS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the built-in data sources.
    Sources,
    /// Fetch one source, print a summary and preview, optionally plot/export.
    Fetch(FetchArgs),
    /// Launch the interactive TUI.
    ///
    /// Uses the same fetch pipeline as `hks fetch`, but renders the chart in a
    /// terminal UI using Ratatui.
    Tui(SourceArgs),
}

/// Source and fetch window.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Data source.
    #[arg(short = 's', long, value_enum, default_value_t = SourceId::Hibor)]
    pub source: SourceId,

    /// First date to request (default: 1 January of last year).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Last date to request (default: today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,
}

/// Options for `hks fetch`.
#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Variables to plot, comma separated (default: first two numeric columns).
    #[arg(long, value_delimiter = ',', value_name = "COLS")]
    pub variables: Vec<String>,

    /// Start of the plotted range (default: first loaded date).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub show_from: Option<NaiveDate>,

    /// End of the plotted range (default: last loaded date).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub show_to: Option<NaiveDate>,

    /// Render a text chart of the selected variables.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the full dataset to CSV. Without a value, uses the default file name.
    #[arg(long, value_name = "CSV", num_args = 0..=1, default_missing_value = "", value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from))]
    pub export: Option<PathBuf>,

    /// Export only the plotted range to CSV. Without a value, uses the default file name.
    #[arg(long, value_name = "CSV", num_args = 0..=1, default_missing_value = "", value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from))]
    pub export_range: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fetch_flags() {
        let cli = Cli::parse_from([
            "hks",
            "fetch",
            "-s",
            "money-supply",
            "--from",
            "2023-01-01",
            "--variables",
            "m1,m2",
            "--export",
            "--timeout-secs",
            "5",
        ]);
        assert_eq!(cli.global.timeout_secs, 5);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.source.source, SourceId::MoneySupply);
        assert_eq!(args.source.from, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(args.variables, vec!["m1".to_string(), "m2".to_string()]);
        assert_eq!(args.export, Some(PathBuf::new()));
        assert!(args.export_range.is_none());
    }
}
