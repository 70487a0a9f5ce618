//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once per fetch and then only read
//! - filtered/sliced cheaply on every chart redraw
//! - exported to CSV without another conversion step

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record as returned by a page of the statistics API.
///
/// Values are untyped scalars (string / number / null).
pub type RawRecord = Map<String, Value>;

/// Known data sources.
///
/// The set is closed; each variant has exactly one [`SourceConfig`]
/// (see `data::registry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    /// HIBOR fixings, daily.
    Hibor,
    /// Hong Kong interbank interest rates, daily (all segments).
    InterbankRates,
    /// Effective exchange rate indices, daily.
    ExchangeRates,
    /// Monetary aggregates, monthly.
    MoneySupply,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Hibor,
        SourceId::InterbankRates,
        SourceId::ExchangeRates,
        SourceId::MoneySupply,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            SourceId::Hibor => "hibor",
            SourceId::InterbankRates => "interbank-rates",
            SourceId::ExchangeRates => "exchange-rates",
            SourceId::MoneySupply => "money-supply",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SourceId::Hibor => 0,
            SourceId::InterbankRates => 1,
            SourceId::ExchangeRates => 2,
            SourceId::MoneySupply => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Static per-source configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConfig {
    pub id: SourceId,
    pub endpoint: &'static str,
    /// Optional `segment` query parameter.
    pub segment: Option<&'static str>,
    /// Canonical date field for ordering and range filtering.
    pub date_field: &'static str,
    pub title: &'static str,
}

impl SourceConfig {
    pub fn granularity(&self) -> DateGranularity {
        DateGranularity::from_field(self.date_field)
    }
}

/// Time resolution of a source, derived from its canonical date field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    Daily,
    Monthly,
}

impl DateGranularity {
    pub fn from_field(field: &str) -> Self {
        if field.to_ascii_lowercase().contains("month") {
            DateGranularity::Monthly
        } else {
            DateGranularity::Daily
        }
    }

    /// Format a timestamp the way exports expect (`YYYY-MM-DD` or `YYYY-MM`).
    pub fn format(self, dt: &NaiveDateTime) -> String {
        match self {
            DateGranularity::Daily => dt.format("%Y-%m-%d").to_string(),
            DateGranularity::Monthly => dt.format("%Y-%m").to_string(),
        }
    }
}

/// Inclusive calendar span `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateSpan {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }
}

/// The selected plotting range. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeState {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RangeState {
    pub fn full(span: DateSpan) -> Self {
        Self {
            start: span.min,
            end: span.max,
        }
    }
}

/// One normalized row. `values` is aligned with [`Dataset::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: NaiveDateTime,
    pub values: Vec<Value>,
}

/// Normalized, date-sorted table for one source and one fetch window.
///
/// Built by `io::normalize` only; never mutated afterwards. Rows are sorted
/// ascending by `date` (ties keep arrival order) and every row has a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    date_column: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub(crate) fn new(date_column: String, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            date_column,
            columns,
            rows,
        }
    }

    pub fn empty(date_column: impl Into<String>) -> Self {
        Self::new(date_column.into(), Vec::new(), Vec::new())
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Non-date columns, in first-seen record order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn span(&self) -> Option<DateSpan> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some(DateSpan {
            min: first.date.date(),
            max: last.date.date(),
        })
    }

    /// Rows whose calendar date falls in `[start, end]`.
    ///
    /// Comparison is by date only, so a timestamp late on `end` is included.
    pub fn rows_between(&self, start: NaiveDate, end: NaiveDate) -> &[Row] {
        if start > end {
            return &[];
        }
        let lo = self.rows.partition_point(|r| r.date.date() < start);
        let hi = self.rows.partition_point(|r| r.date.date() <= end);
        &self.rows[lo..hi.max(lo)]
    }

    /// Numeric view of one column for the given rows (`None` = gap).
    pub fn numeric_column(&self, rows: &[Row], column: &str) -> Vec<Option<f64>> {
        let Some(idx) = self.column_index(column) else {
            return vec![None; rows.len()];
        };
        rows.iter()
            .map(|r| r.values.get(idx).and_then(coerce_f64))
            .collect()
    }

    /// True when the column has at least one value and every non-null value
    /// coerces to a number.
    pub fn is_numeric_column(&self, column: &str) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        let mut seen = false;
        for row in &self.rows {
            match row.values.get(idx) {
                None | Some(Value::Null) => {}
                Some(v) => {
                    if coerce_f64(v).is_none() {
                        return false;
                    }
                    seen = true;
                }
            }
        }
        seen
    }
}

/// Coerce a scalar to `f64`; anything non-numeric becomes `None`.
///
/// Numeric strings (`"4.25"`) are accepted, matching how the API sometimes
/// quotes figures.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Display label and unit for one variable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub label: String,
    pub unit: String,
}

/// Variable code -> {label, unit}. Read-only after loading.
#[derive(Debug, Clone, Default)]
pub struct VariableMeta {
    entries: HashMap<String, VariableInfo>,
}

impl VariableMeta {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert unless the code is already present (first occurrence wins).
    pub fn insert_first(&mut self, code: impl Into<String>, info: VariableInfo) -> bool {
        let code = code.into();
        if self.entries.contains_key(&code) {
            return false;
        }
        self.entries.insert(code, info);
        true
    }

    pub fn get(&self, code: &str) -> Option<&VariableInfo> {
        self.entries.get(code)
    }

    /// Metadata for `code`, falling back to `{label = code, unit = ""}`.
    pub fn lookup(&self, code: &str) -> VariableInfo {
        self.entries.get(code).cloned().unwrap_or_else(|| VariableInfo {
            label: code.to_string(),
            unit: String::new(),
        })
    }

    /// Human-facing label: the metadata label, or a prettified code
    /// (`ir_1m` -> `IR 1M`) when no entry exists.
    pub fn display_label(&self, code: &str) -> String {
        match self.entries.get(code) {
            Some(info) if !info.label.trim().is_empty() => info.label.clone(),
            _ => code.to_uppercase().replace('_', " "),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which y-axis a series is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left axis, magnitude-like series.
    Primary,
    /// Right axis, rate-like series.
    Secondary,
}

/// Disjoint split of the selected variables across the two y-axes.
///
/// Order follows the selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisPartition {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

impl AxisPartition {
    pub fn axis_of(&self, column: &str) -> Option<Axis> {
        if self.primary.iter().any(|c| c == column) {
            Some(Axis::Primary)
        } else if self.secondary.iter().any(|c| c == column) {
            Some(Axis::Secondary)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}
