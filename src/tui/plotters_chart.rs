//! Plotters-powered dual-axis time-series widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - a real secondary y-axis with its own coordinate system
//! - dashed line series for the right axis
//! - less manual work for ticks/labels
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{
    ChartModel, ChartSeries, LineStyle, format_date_tick, format_primary_tick, format_secondary_tick,
    palette_rgb,
};
use crate::domain::Axis;

/// Render-only wrapper around a [`ChartModel`].
///
/// All series, bounds and styles are computed by [`crate::chart::render`];
/// this widget only draws them.
pub struct DualAxisChart<'a> {
    pub model: &'a ChartModel,
}

impl<'a> Widget for DualAxisChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 30 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let model = self.model;
        let [x0, x1] = model.x_bounds;
        // Either axis may be all gaps in the selected range; the other still draws.
        let (has_primary, [y0, y1], [s0, s1]) = match (model.primary_bounds, model.secondary_bounds) {
            (None, None) => {
                buf.set_string(
                    area.x,
                    area.y,
                    "Selected variables have no numeric values in this range.",
                    Style::default().fg(Color::Yellow),
                );
                return;
            }
            (Some(primary), secondary) => (true, primary, secondary.unwrap_or([0.0, 1.0])),
            (None, Some(secondary)) => (false, secondary, secondary),
        };

        if ![x0, x1, y0, y1, s0, s1].iter().all(|v| v.is_finite()) || x1 <= x0 || y1 <= y0 || s1 <= s0 {
            return;
        }

        let has_secondary = model.has_secondary();
        let primary_desc = axis_caption(model, Axis::Primary);
        let secondary_desc = axis_caption(model, Axis::Secondary);

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 10)
                .set_label_area_size(LabelAreaPosition::Right, if has_secondary { 8 } else { 0 })
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?
                .set_secondary_coord(x0..x1, s0..s1);

            // We disable the mesh lines to reduce visual clutter in low-resolution
            // terminal rendering; the axes + labels are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(primary_desc.as_str())
                .x_labels(4)
                .y_labels(if has_primary { 5 } else { 0 })
                .x_label_formatter(&|v| format_date_tick(*v))
                .y_label_formatter(&|v| format_primary_tick(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            if has_secondary {
                chart
                    .configure_secondary_axes()
                    .y_desc(secondary_desc.as_str())
                    .y_labels(5)
                    .y_label_formatter(&|v| format_secondary_tick(*v))
                    .label_style(("sans-serif", 10).into_font().color(&WHITE))
                    .axis_style(&WHITE)
                    .draw()?;
            }

            // Each contiguous segment is its own series so gaps stay gaps.
            for series in &model.series {
                let color = series_color(series);
                for segment in &series.segments {
                    if let [point] = segment.as_slice() {
                        // A lone point has no line to draw.
                        //
                        // We avoid `Circle` markers: the backend maps circle
                        // radii to huge canvas shapes.
                        let pixel = Pixel::new(*point, color);
                        match series.axis {
                            Axis::Primary => {
                                chart.draw_series(std::iter::once(pixel))?;
                            }
                            Axis::Secondary => {
                                chart.draw_secondary_series(std::iter::once(pixel))?;
                            }
                        }
                        continue;
                    }
                    let points = segment.iter().copied();
                    match (series.axis, series.style) {
                        (Axis::Primary, _) => {
                            chart.draw_series(LineSeries::new(points, &color))?;
                        }
                        (Axis::Secondary, LineStyle::Solid) => {
                            chart.draw_secondary_series(LineSeries::new(points, &color))?;
                        }
                        (Axis::Secondary, LineStyle::Dashed) => {
                            chart.draw_secondary_series(DashedLineSeries::new(
                                points,
                                2,
                                1,
                                color.stroke_width(1),
                            ))?;
                        }
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn series_color(series: &ChartSeries) -> RGBColor {
    let (r, g, b) = palette_rgb(series.color);
    RGBColor(r, g, b)
}

/// Distinct units of the series on `axis`, e.g. `HK$ million` or `%`.
pub fn axis_caption(model: &ChartModel, axis: Axis) -> String {
    let mut units: Vec<&str> = Vec::new();
    for s in model.series_on(axis) {
        let unit = s.unit.trim();
        if !unit.is_empty() && !units.contains(&unit) {
            units.push(unit);
        }
    }
    units.join(", ")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::chart::LegendEntry;
    use crate::domain::RangeState;

    fn series(column: &str, unit: &str, axis: Axis) -> ChartSeries {
        ChartSeries {
            column: column.to_string(),
            label: column.to_string(),
            unit: unit.to_string(),
            axis,
            style: LineStyle::for_axis(axis),
            color: 0,
            segments: vec![vec![(1.0, 1.0), (2.0, 2.0)]],
        }
    }

    fn model(series: Vec<ChartSeries>) -> ChartModel {
        let d = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        ChartModel {
            title: "t".to_string(),
            range: RangeState { start: d, end: d },
            rows: 2,
            x_bounds: [1.0, 2.0],
            primary_bounds: Some([0.0, 3.0]),
            secondary_bounds: None,
            legend: Vec::<LegendEntry>::new(),
            series,
        }
    }

    #[test]
    fn captions_list_distinct_units_per_axis() {
        let m = model(vec![
            series("m1", "HK$ million", Axis::Primary),
            series("m2", "HK$ million", Axis::Primary),
            series("r", "%", Axis::Secondary),
            series("x", " ", Axis::Secondary),
        ]);
        assert_eq!(axis_caption(&m, Axis::Primary), "HK$ million");
        assert_eq!(axis_caption(&m, Axis::Secondary), "%");
    }

    fn buffer_text(buf: &Buffer, area: Rect) -> String {
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn right_axis_draws_when_left_axis_has_no_values() {
        let mut m = model(vec![series("rate", "%", Axis::Secondary)]);
        m.primary_bounds = None;
        m.secondary_bounds = Some([3.9, 4.5]);
        m.series[0].segments = vec![vec![(1.0, 4.0), (2.0, 4.4)]];

        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        DualAxisChart { model: &m }.render(area, &mut buf);
        let text = buffer_text(&buf, area);
        assert!(!text.contains("no numeric values"), "{text}");
        assert!(text.chars().any(|c| !c.is_whitespace()));
    }

    #[test]
    fn hint_when_neither_axis_has_values() {
        let mut m = model(vec![series("m1", "", Axis::Primary)]);
        m.primary_bounds = None;
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        DualAxisChart { model: &m }.render(area, &mut buf);
        assert!(buffer_text(&buf, area).starts_with("Selected variables have no numeric values"));
    }

    #[test]
    fn tiny_area_renders_hint_instead_of_panicking() {
        let m = model(vec![series("m1", "", Axis::Primary)]);
        let area = Rect::new(0, 0, 20, 4);
        let mut buf = Buffer::empty(area);
        DualAxisChart { model: &m }.render(area, &mut buf);
        let first: String = (0..20u16).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(first.starts_with("Chart area too"));
    }
}
