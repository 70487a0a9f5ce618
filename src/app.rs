//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - validates the source registry and loads variable metadata
//! - fetches, summarizes, plots and exports (`hks fetch`)
//! - or hands over to the TUI (`hks tui`)

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use tracing::debug;

use crate::app::pipeline::FetchStatus;
use crate::cli::{Command, FetchArgs, SourceArgs};
use crate::config::AppConfig;
use crate::data::{FetchCache, HkmaClient, SourceRegistry};
use crate::domain::{RangeState, SourceConfig};
use crate::error::{AppError, ValidationError};
use crate::io::export::{default_export_name, write_dataset_csv};
use crate::logging::Output;
use crate::range::Bound;
use crate::session::{Session, default_window};

pub mod pipeline;

/// Entry point for the `hks` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; flags and the real environment still apply.
    let dotenv = dotenvy::dotenv();

    // We want `hks` and `hks -s money-supply` to behave like `hks tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let config = AppConfig::from_args(&cli.global)?;
    let output = match cli.command {
        Command::Tui(_) => Output::Tui,
        _ => Output::Cli,
    };
    crate::logging::init(&config, output)?;
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    let registry = SourceRegistry::builtin();
    registry.validate()?;

    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Sources => {
            print!("{}", crate::report::format_sources(&registry));
            Ok(())
        }
        Command::Fetch(args) => handle_fetch(args, &config, &registry, today),
        Command::Tui(args) => handle_tui(args, &config, &registry, today),
    }
}

/// Fetch window from `--from/--to`, defaulting either side.
pub fn fetch_window(args: &SourceArgs, today: NaiveDate) -> Result<RangeState, AppError> {
    let default = default_window(today);
    let start = args.from.unwrap_or(default.start);
    let end = args.to.unwrap_or(default.end);
    if start > end {
        return Err(ValidationError::StartAfterEnd { start, end }.into());
    }
    Ok(RangeState { start, end })
}

fn handle_tui(args: SourceArgs, config: &AppConfig, registry: &SourceRegistry, today: NaiveDate) -> Result<(), AppError> {
    let window = fetch_window(&args, today)?;
    let meta = config.load_meta();
    crate::tui::run(args.source, window, config, registry, &meta)
}

fn handle_fetch(args: FetchArgs, config: &AppConfig, registry: &SourceRegistry, today: NaiveDate) -> Result<(), AppError> {
    let window = fetch_window(&args.source, today)?;
    let meta = config.load_meta();
    let client = HkmaClient::new(config.timeout)?;
    let source = registry.get(args.source.source);

    let mut cache = FetchCache::new();
    let status = pipeline::run_fetch(&client, &mut cache, source, window.start, window.end);
    let (normalized, stats, interrupted) = match status {
        FetchStatus::Loaded {
            normalized,
            stats,
            interrupted,
        } => (normalized, stats, interrupted),
        FetchStatus::Empty { interrupted, .. } => {
            let mut message = format!(
                "No {} data between {} and {}.",
                source.id.slug(),
                window.start,
                window.end
            );
            if let Some(err) = interrupted {
                message.push_str(&format!(" (fetch interrupted: {err})"));
            }
            return Err(AppError::new(3, message));
        }
        FetchStatus::Failed(err) => return Err(err.into()),
        FetchStatus::Schema(err) => return Err(err.into()),
    };

    // Print terminal output. Dates follow the source's canonical field,
    // whichever field the Normalizer actually found.
    let granularity = source.granularity();
    println!(
        "{}",
        crate::report::format_fetch_summary(
            source,
            window,
            &normalized.dataset,
            &normalized.report,
            &stats,
            interrupted.as_ref(),
        )
    );
    println!(
        "{}",
        crate::report::format_preview(&normalized.dataset, granularity, crate::report::PREVIEW_ROWS)
    );

    let mut session = Session::new(source.id, window);
    session.load_dataset(normalized.dataset);
    apply_view_args(&mut session, &args)?;

    if args.plot {
        let model = session.chart(&meta, registry)?;
        println!("{}", crate::plot::render_chart(&model, args.width, args.height));
    }

    // Optional exports.
    if let Some(path) = &args.export {
        let (path, rows) = write_export(path, &session, source, false)?;
        println!("Wrote {rows} rows to {}", path.display());
    }
    if let Some(path) = &args.export_range {
        let (path, rows) = write_export(path, &session, source, true)?;
        println!("Wrote {rows} rows to {}", path.display());
    }

    Ok(())
}

/// Write the full dataset (or the selected range) and return the path and row count.
fn write_export(
    arg: &Path,
    session: &Session,
    source: &SourceConfig,
    range_only: bool,
) -> Result<(PathBuf, usize), AppError> {
    let Some(dataset) = session.dataset() else {
        return Err(AppError::new(3, "No data loaded; nothing to export."));
    };
    let path = export_path(arg, session);
    let rows = if range_only {
        session.selected_rows()
    } else {
        dataset.rows()
    };
    write_dataset_csv(&path, dataset, rows, source.granularity())?;
    Ok((path, rows.len()))
}

/// Apply `--variables` and `--show-from/--show-to` to a freshly loaded session.
pub fn apply_view_args(session: &mut Session, args: &FetchArgs) -> Result<(), AppError> {
    if !args.variables.is_empty() {
        let available = session.available_variables();
        let unknown: Vec<&str> = args
            .variables
            .iter()
            .filter(|v| !available.contains(v))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::new(
                2,
                format!(
                    "Unknown variable(s): {}. Available: {}",
                    unknown.join(", "),
                    available.join(", ")
                ),
            ));
        }
        session.set_selected(&args.variables);
    }

    // Bound inputs, one at a time, starting from the full span.
    if let Some(start) = args.show_from {
        session.apply_bound(Bound::Start(start))?;
    }
    if let Some(end) = args.show_to {
        session.apply_bound(Bound::End(end))?;
    }
    Ok(())
}

/// `--export` without a value means the default file name.
fn export_path(arg: &Path, session: &Session) -> PathBuf {
    match session.dataset() {
        Some(dataset) if arg.as_os_str().is_empty() => default_export_name(session.source(), dataset),
        _ => arg.to_path_buf(),
    }
}

/// Rewrite argv so `hks` defaults to `hks tui`.
///
/// Rules:
/// - `hks`                      -> `hks tui`
/// - `hks -s hibor ...`         -> `hks tui -s hibor ...`
/// - `hks --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // Global flags may come before the subcommand (`hks --meta m.csv fetch`).
    let has_subcommand = argv
        .iter()
        .skip(1)
        .any(|a| matches!(a.as_str(), "sources" | "fetch" | "tui"));
    if has_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
