//! Axis assignment for dual-axis charts.
//!
//! Rate-like series (percentages, yields, indices) go on the right axis,
//! magnitude-like series (amounts) on the left. The rules are plain substring
//! checks on the metadata label and unit:
//!
//! - unit contains `%` or an annualized-rate marker -> rate-like
//! - label contains one of [`RATE_LABEL_KEYWORDS`] -> rate-like
//! - otherwise -> magnitude-like
//!
//! If nothing lands on the left axis, everything is moved there: a single
//! left-axis chart reads better than a chart with only a right axis.

use crate::domain::{AxisPartition, Dataset, VariableMeta};

/// Structural / key-like columns that are never offered for plotting.
pub const EXCLUDED_COLUMNS: [&str; 10] = [
    "id",
    "year",
    "month",
    "day",
    "quarter",
    "count",
    "record_count",
    "rec_count",
    "records",
    "seq",
];

/// Unit markers for percentages and annualized rates (matched case-insensitively).
pub const RATE_UNIT_MARKERS: [&str; 5] = ["%", "p.a.", "per annum", "annualized", "annualised"];

/// Label keywords for rates, yields and indices (matched case-insensitively).
pub const RATE_LABEL_KEYWORDS: [&str; 5] = ["rate", "yield", "index", "hibor", "interbank"];

fn is_excluded(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    EXCLUDED_COLUMNS.contains(&lower.as_str()) || lower.ends_with("_id")
}

/// Columns offered for plotting.
///
/// Numeric columns minus structural ones; when none remain, every non-date
/// column.
pub fn candidate_columns(dataset: &Dataset) -> Vec<String> {
    let numeric: Vec<String> = dataset
        .columns()
        .iter()
        .filter(|c| !is_excluded(c) && dataset.is_numeric_column(c))
        .cloned()
        .collect();

    if numeric.is_empty() {
        return dataset.columns().to_vec();
    }
    numeric
}

pub fn is_rate_like(label: &str, unit: &str) -> bool {
    let unit = unit.to_lowercase();
    if RATE_UNIT_MARKERS.iter().any(|m| unit.contains(m)) {
        return true;
    }
    let label = label.to_lowercase();
    RATE_LABEL_KEYWORDS.iter().any(|k| label.contains(k))
}

/// Split `columns` between the two axes, preserving their order.
pub fn classify(columns: &[String], meta: &VariableMeta) -> AxisPartition {
    let mut partition = AxisPartition::default();
    for column in columns {
        let info = meta.lookup(column);
        if is_rate_like(&info.label, &info.unit) {
            partition.secondary.push(column.clone());
        } else {
            partition.primary.push(column.clone());
        }
    }

    if partition.primary.is_empty() && !partition.secondary.is_empty() {
        partition.primary = std::mem::take(&mut partition.secondary);
    }
    partition
}
