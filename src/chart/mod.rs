//! Dual-axis chart model.
//!
//! `render` turns a dataset slice into a backend-neutral description: line
//! segments per series (gaps split segments), axis bounds, a merged legend
//! and the per-axis tick formatters. Drawing lives elsewhere (`tui` for the
//! plotters widget, `plot` for plain text), so everything here is testable
//! without a terminal.

use chrono::{Datelike, NaiveDate};

use crate::domain::{Axis, AxisPartition, Dataset, RangeState, VariableMeta};
use crate::error::RenderError;

/// Stroke style. Right-axis series are always dashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

impl LineStyle {
    pub fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::Primary => LineStyle::Solid,
            Axis::Secondary => LineStyle::Dashed,
        }
    }
}

/// High-contrast palette (terminal friendly), cycled per series.
pub const PALETTE: [(u8, u8, u8); 6] = [
    (0, 255, 255),   // cyan
    (255, 200, 0),   // amber
    (0, 255, 0),     // green
    (255, 80, 255),  // magenta
    (255, 80, 80),   // red
    (120, 160, 255), // blue
];

pub fn palette_rgb(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

/// One plotted variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub column: String,
    pub label: String,
    pub unit: String,
    pub axis: Axis,
    pub style: LineStyle,
    pub color: usize,
    /// Contiguous runs of `(x, y)`; a missing value ends a run.
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl ChartSeries {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.segments.iter().flatten().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub text: String,
    pub axis: Axis,
    pub style: LineStyle,
    pub color: usize,
}

/// Everything a backend needs to draw the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub title: String,
    pub range: RangeState,
    /// Rows inside the range.
    pub rows: usize,
    /// x is days since CE (see [`date_to_x`]).
    pub x_bounds: [f64; 2],
    pub primary_bounds: Option<[f64; 2]>,
    pub secondary_bounds: Option<[f64; 2]>,
    pub series: Vec<ChartSeries>,
    pub legend: Vec<LegendEntry>,
}

impl ChartModel {
    pub fn has_secondary(&self) -> bool {
        self.series.iter().any(|s| s.axis == Axis::Secondary)
    }

    pub fn series_on(&self, axis: Axis) -> impl Iterator<Item = &ChartSeries> {
        self.series.iter().filter(move |s| s.axis == axis)
    }
}

/// Build the chart for `selected` over `range`.
///
/// Rows are filtered by calendar date, inclusive. Variables listed in
/// `partition.secondary` use the right axis; all others the left.
pub fn render(
    dataset: &Dataset,
    range: &RangeState,
    selected: &[String],
    partition: &AxisPartition,
    meta: &VariableMeta,
    title: &str,
) -> Result<ChartModel, RenderError> {
    let rows = dataset.rows_between(range.start, range.end);
    if rows.is_empty() {
        return Err(RenderError::EmptyRange {
            start: range.start,
            end: range.end,
        });
    }
    if selected.is_empty() {
        return Err(RenderError::NoVariables);
    }

    let xs: Vec<f64> = rows.iter().map(|r| date_to_x(r.date.date())).collect();

    let mut series = Vec::with_capacity(selected.len());
    for (idx, column) in selected.iter().enumerate() {
        let axis = partition.axis_of(column).unwrap_or(Axis::Primary);
        let values = dataset.numeric_column(rows, column);
        let info = meta.lookup(column);
        series.push(ChartSeries {
            column: column.clone(),
            label: meta.display_label(column),
            unit: info.unit,
            axis,
            style: LineStyle::for_axis(axis),
            color: idx,
            segments: split_segments(&xs, &values),
        });
    }

    let legend = series.iter().map(legend_entry).collect();

    Ok(ChartModel {
        title: format!("{title} ({} to {})", range.start, range.end),
        range: *range,
        rows: rows.len(),
        x_bounds: x_bounds(range),
        primary_bounds: y_bounds(series.iter().filter(|s| s.axis == Axis::Primary)),
        secondary_bounds: y_bounds(series.iter().filter(|s| s.axis == Axis::Secondary)),
        series,
        legend,
    })
}

fn legend_entry(s: &ChartSeries) -> LegendEntry {
    let mut text = s.label.clone();
    if !s.unit.trim().is_empty() {
        text.push_str(&format!(" [{}]", s.unit.trim()));
    }
    if s.axis == Axis::Secondary {
        text.push_str(" (R)");
    }
    LegendEntry {
        text,
        axis: s.axis,
        style: s.style,
        color: s.color,
    }
}

fn split_segments(xs: &[f64], values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (&x, value) in xs.iter().zip(values) {
        match value {
            Some(y) => current.push((x, *y)),
            None => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn x_bounds(range: &RangeState) -> [f64; 2] {
    let x0 = date_to_x(range.start);
    let x1 = date_to_x(range.end);
    if x1 > x0 { [x0, x1] } else { [x0 - 0.5, x0 + 0.5] }
}

fn y_bounds<'a>(series: impl Iterator<Item = &'a ChartSeries>) -> Option<[f64; 2]> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in series {
        for (_, y) in s.points() {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }

    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        (lo.abs() * 0.05).max(0.5)
    };
    Some([lo - pad, hi + pad])
}

/// Calendar date to chart x (days since CE).
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Left-axis ticks: `0`, two decimals below 1000, grouped integers above.
pub fn format_primary_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    // Compare after rounding so 999.996 does not print as `1000.00`.
    if (v.abs() * 100.0).round() < 100_000.0 {
        return format!("{v:.2}");
    }
    group_thousands(v.round())
}

/// Right-axis ticks: always two decimals.
pub fn format_secondary_tick(v: f64) -> String {
    format!("{v:.2}")
}

pub fn format_date_tick(x: f64) -> String {
    x_to_date(x).map(|d| d.to_string()).unwrap_or_default()
}

fn group_thousands(v: f64) -> String {
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
