//! Record normalization.
//!
//! Turns the flat, loosely-typed records of one fetch into a [`Dataset`]:
//!
//! - **Date discovery**: the first candidate field present in the schema wins
//!   (no guessing beyond the ordered candidate list)
//! - **Row-level tolerance**: rows whose date does not parse are dropped and
//!   counted, they never fail the whole batch
//! - **Range re-check**: rows outside `[start, end]` are dropped even if the
//!   API was asked to filter already
//! - **Stable ordering**: ascending by date, ties keep arrival order

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tracing::debug;

use crate::domain::{Dataset, RawRecord, Row};
use crate::error::SchemaError;

/// Date fields tried after the source's canonical field, in priority order.
pub const DEFAULT_DATE_FIELDS: [&str; 5] = [
    "end_of_day",
    "end_of_date",
    "end_of_month",
    "date",
    "observation_date",
];

/// Row counts for one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub dropped_unparseable: usize,
    pub dropped_out_of_range: usize,
}

impl NormalizeReport {
    pub fn rows_used(&self) -> usize {
        self.rows_read - self.dropped_unparseable - self.dropped_out_of_range
    }
}

/// Normalization output: the dataset plus what was dropped on the way.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    pub report: NormalizeReport,
}

/// Candidate list for a source: canonical field first, then the defaults.
pub fn candidate_date_fields(canonical: &str) -> Vec<String> {
    let mut out = vec![canonical.to_string()];
    for field in DEFAULT_DATE_FIELDS {
        if !out.iter().any(|f| f == field) {
            out.push(field.to_string());
        }
    }
    out
}

/// Normalize `records` into a dataset restricted to `[start, end]`.
///
/// An empty input yields an empty dataset, not an error.
pub fn normalize<S: AsRef<str>>(
    records: &[RawRecord],
    candidate_fields: &[S],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Normalized, SchemaError> {
    if records.is_empty() {
        let date_column = candidate_fields
            .first()
            .map(|f| f.as_ref().to_owned())
            .unwrap_or_else(|| "date".to_string());
        return Ok(Normalized {
            dataset: Dataset::empty(date_column),
            report: NormalizeReport::default(),
        });
    }

    let schema = collect_schema(records);
    let candidates: Vec<&str> = candidate_fields.iter().map(|f| f.as_ref()).collect();
    let date_column = candidates
        .iter()
        .find(|f| schema.iter().any(|c| c.as_str() == **f))
        .map(|f| f.to_string())
        .ok_or_else(|| SchemaError::NoDateField {
            tried: candidates.iter().map(|f| f.to_string()).collect(),
            available: schema.clone(),
        })?;

    let columns: Vec<String> = schema.into_iter().filter(|c| *c != date_column).collect();

    let mut report = NormalizeReport {
        rows_read: records.len(),
        ..NormalizeReport::default()
    };
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let Some(date) = record.get(&date_column).and_then(parse_datetime) else {
            report.dropped_unparseable += 1;
            continue;
        };
        let day = date.date();
        if day < start || day > end {
            report.dropped_out_of_range += 1;
            continue;
        }
        let values = columns
            .iter()
            .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
            .collect();
        rows.push(Row { date, values });
    }

    // `sort_by_key` is stable: equal dates keep arrival order.
    rows.sort_by_key(|r| r.date);

    debug!(
        date_column = %date_column,
        rows = rows.len(),
        dropped_unparseable = report.dropped_unparseable,
        dropped_out_of_range = report.dropped_out_of_range,
        "normalized records"
    );

    Ok(Normalized {
        dataset: Dataset::new(date_column, columns, rows),
        report,
    })
}

/// Union of field names across records, in first-seen order.
fn collect_schema(records: &[RawRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                out.push(key.clone());
            }
        }
    }
    out
}

/// Parse a date/time scalar. Only strings are accepted.
///
/// Accepted: RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD`, `YYYY/MM/DD`, and month-level `YYYY-MM` (first of month).
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    const DATE_FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    // chrono cannot parse a date without a day, so pin it to the 1st.
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .ok()
        .filter(|_| s.len() == 7)
        .map(|d| d.and_time(NaiveTime::MIN))
}
