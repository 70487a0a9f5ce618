//! ASCII plotting of a [`ChartModel`] for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - left-axis series: `*`, `+`, `o`, `x`, `#` (solid glyphs)
//! - right-axis series: `.`, `:`, `~`, `^`, `'` (dotted glyphs)
//! - left labels use the left-axis tick format, right labels the right-axis one

use crate::chart::{ChartModel, format_primary_tick, format_secondary_tick};
use crate::domain::Axis;

const PRIMARY_GLYPHS: [char; 5] = ['*', '+', 'o', 'x', '#'];
const SECONDARY_GLYPHS: [char; 5] = ['.', ':', '~', '^', '\''];

/// Render `model` into a `width` x `height` character grid plus axes and legend.
pub fn render_chart(model: &ChartModel, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let glyphs = series_glyphs(model);

    let mut grid = vec![vec![' '; width]; height];
    let [x_min, x_max] = model.x_bounds;

    // Left axis first so its solid glyphs win where lines cross.
    for axis in [Axis::Primary, Axis::Secondary] {
        let bounds = match axis {
            Axis::Primary => model.primary_bounds,
            Axis::Secondary => model.secondary_bounds,
        };
        let Some([y_min, y_max]) = bounds else {
            continue;
        };
        for (series, &ch) in model.series.iter().zip(&glyphs) {
            if series.axis != axis {
                continue;
            }
            for segment in &series.segments {
                let cells: Vec<(usize, usize)> = segment
                    .iter()
                    .map(|&(x, y)| (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height)))
                    .collect();
                draw_polyline(&mut grid, &cells, ch);
            }
        }
    }

    let left = axis_labels(model.primary_bounds, height, format_primary_tick);
    let right = axis_labels(model.secondary_bounds, height, format_secondary_tick);
    let label_width = left.iter().map(|s| s.len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&model.title);
    out.push('\n');

    for (i, row) in grid.into_iter().enumerate() {
        let mut line = format!("{:>label_width$} |", left[i]);
        line.extend(row);
        line.push('|');
        if !right[i].is_empty() {
            line.push(' ');
            line.push_str(&right[i]);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&format!("{:>label_width$} +{:-<width$}+\n", "", ""));
    out.push_str(&date_axis(model, label_width + 2, width));

    for (entry, ch) in model.legend.iter().zip(&glyphs) {
        out.push_str(&format!("  {ch} {}\n", entry.text));
    }

    out
}

/// Glyph per series, cycling separately through each axis's glyph set.
fn series_glyphs(model: &ChartModel) -> Vec<char> {
    let (mut primary, mut secondary) = (0usize, 0usize);
    model
        .series
        .iter()
        .map(|s| match s.axis {
            Axis::Primary => {
                primary += 1;
                PRIMARY_GLYPHS[(primary - 1) % PRIMARY_GLYPHS.len()]
            }
            Axis::Secondary => {
                secondary += 1;
                SECONDARY_GLYPHS[(secondary - 1) % SECONDARY_GLYPHS.len()]
            }
        })
        .collect()
}

/// Labels for top, middle and bottom rows; blank elsewhere.
fn axis_labels(bounds: Option<[f64; 2]>, height: usize, fmt: fn(f64) -> String) -> Vec<String> {
    let mut labels = vec![String::new(); height];
    if let Some([lo, hi]) = bounds {
        labels[0] = fmt(hi);
        labels[(height - 1) / 2] = fmt((lo + hi) / 2.0);
        labels[height - 1] = fmt(lo);
    }
    labels
}

fn date_axis(model: &ChartModel, indent: usize, width: usize) -> String {
    let start = model.range.start.to_string();
    let end = model.range.end.to_string();
    let gap = width.saturating_sub(start.len() + end.len()).max(1);
    format!("{:indent$}{start}{:gap$}{end}\n", "", "")
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], cells: &[(usize, usize)], ch: char) {
    let mut prev = None;
    for &(x, y) in cells {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => {
                if grid[y][x] == ' ' {
                    grid[y][x] = ch;
                }
            }
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::chart::render;
    use crate::domain::{AxisPartition, Dataset, RangeState, RawRecord, VariableMeta};
    use crate::io::normalize::normalize;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dataset() -> Dataset {
        let records: Vec<RawRecord> = [("2023-01-01", 100.0, 5.0), ("2023-01-31", 200.0, 4.0)]
            .iter()
            .map(|(date, m1, rate)| {
                let mut r = RawRecord::new();
                r.insert("end_of_month".to_string(), json!(date));
                r.insert("m1".to_string(), json!(m1));
                r.insert("rate".to_string(), json!(rate));
                r
            })
            .collect();
        normalize(&records, &["end_of_month"], d(2023, 1, 1), d(2023, 12, 31))
            .unwrap()
            .dataset
    }

    fn grid_row(text: &str, row: usize) -> Vec<char> {
        let line = text.lines().nth(row + 1).unwrap();
        let start = line.find('|').unwrap() + 1;
        line[start..].chars().take(10).collect()
    }

    #[test]
    fn single_axis_line_spans_the_grid() {
        let ds = dataset();
        let partition = AxisPartition { primary: vec!["m1".to_string()], secondary: vec![] };
        let model = render(
            &ds,
            &RangeState { start: d(2023, 1, 1), end: d(2023, 1, 31) },
            &["m1".to_string()],
            &partition,
            &VariableMeta::empty(),
            "Money",
        )
        .unwrap();

        let txt = render_chart(&model, 10, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Money (2023-01-01 to 2023-01-31)");
        // title + 5 rows + axis + dates + 1 legend line
        assert_eq!(lines.len(), 9);
        assert_eq!(grid_row(&txt, 0)[9], '*');
        assert_eq!(grid_row(&txt, 4)[0], '*');
        assert!(lines[1].starts_with("205.00 |"));
        assert!(lines[5].starts_with(" 95.00 |"));
        assert_eq!(lines[8], "  * M1");
    }

    #[test]
    fn secondary_series_gets_dotted_glyph_and_right_labels() {
        let ds = dataset();
        let partition = AxisPartition {
            primary: vec!["m1".to_string()],
            secondary: vec!["rate".to_string()],
        };
        let model = render(
            &ds,
            &RangeState { start: d(2023, 1, 1), end: d(2023, 1, 31) },
            &["m1".to_string(), "rate".to_string()],
            &partition,
            &VariableMeta::empty(),
            "Money",
        )
        .unwrap();

        let txt = render_chart(&model, 10, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[1].ends_with("| 5.05"));
        assert!(lines[5].ends_with("| 3.95"));
        assert_eq!(lines[9], "  . RATE (R)");
        // The rate falls while M1 rises.
        assert_eq!(grid_row(&txt, 0)[0], '.');
        assert_eq!(grid_row(&txt, 4)[9], '.');
        assert_eq!(grid_row(&txt, 4)[0], '*');
    }
}
