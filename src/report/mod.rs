//! Formatted terminal output for `hks sources` and `hks fetch`.
//!
//! We keep formatting code in one place so:
//! - the fetch/normalize code stays free of presentation
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::FetchStats;
use crate::data::SourceRegistry;
use crate::domain::{Dataset, DateGranularity, RangeState, SourceConfig};
use crate::error::TransportError;
use crate::io::export::format_cell;
use crate::io::normalize::NormalizeReport;

/// Rows shown by [`format_preview`] in `hks fetch`.
pub const PREVIEW_ROWS: usize = 5;

const CELL_WIDTH: usize = 12;

/// One line per registered source.
pub fn format_sources(registry: &SourceRegistry) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<16} {:<8} {:<14} {}\n", "source", "freq", "date field", "title"));
    out.push_str(&format!("{:-<16} {:-<8} {:-<14} {:-<24}\n", "", "", "", ""));
    for cfg in registry.iter() {
        let freq = match cfg.granularity() {
            DateGranularity::Daily => "daily",
            DateGranularity::Monthly => "monthly",
        };
        out.push_str(&format!(
            "{:<16} {:<8} {:<14} {}\n",
            cfg.id.slug(),
            freq,
            cfg.date_field,
            cfg.title
        ));
        out.push_str(&format!("{:<16} {}", "", cfg.endpoint));
        if let Some(segment) = cfg.segment {
            out.push_str(&format!(" (segment={segment})"));
        }
        out.push('\n');
    }
    out
}

/// Summary block printed after a successful fetch.
pub fn format_fetch_summary(
    cfg: &SourceConfig,
    window: RangeState,
    dataset: &Dataset,
    report: &NormalizeReport,
    stats: &FetchStats,
    interrupted: Option<&TransportError>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== hks - {} ===\n", cfg.title));
    out.push_str(&format!("Source: {} | window: {} to {}\n", cfg.id.slug(), window.start, window.end));

    let origin = if stats.from_cache {
        "cache".to_string()
    } else {
        format!("{} page(s)", stats.pages)
    };
    out.push_str(&format!("Records: {} from {origin}\n", stats.records));
    out.push_str(&format!(
        "Rows: {} used | {} unparseable date | {} outside window\n",
        report.rows_used(),
        report.dropped_unparseable,
        report.dropped_out_of_range
    ));

    if let Some(span) = dataset.span() {
        out.push_str(&format!("Span: {} to {}\n", span.min, span.max));
    }
    out.push_str(&format!(
        "Columns: {} (date: {})\n",
        dataset.columns().join(", "),
        dataset.date_column()
    ));

    if let Some(err) = interrupted {
        out.push_str(&format!("WARNING: fetch interrupted, results may be incomplete: {err}\n"));
    }

    out
}

/// First `n` rows as a fixed-width table.
pub fn format_preview(dataset: &Dataset, granularity: DateGranularity, n: usize) -> String {
    let mut out = String::new();

    let mut header = format!("{:<CELL_WIDTH$}", truncate(dataset.date_column(), CELL_WIDTH));
    let mut rule = format!("{:-<CELL_WIDTH$}", "");
    for column in dataset.columns() {
        header.push_str(&format!(" {:>CELL_WIDTH$}", truncate(column, CELL_WIDTH)));
        rule.push_str(&format!(" {:-<CELL_WIDTH$}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for row in dataset.rows().iter().take(n) {
        let mut line = format!("{:<CELL_WIDTH$}", granularity.format(&row.date));
        for value in &row.values {
            line.push_str(&format!(" {:>CELL_WIDTH$}", truncate(&format_cell(value), CELL_WIDTH)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if dataset.len() > n {
        out.push_str(&format!("... {} more rows\n", dataset.len() - n));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
