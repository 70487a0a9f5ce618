//! Terminal text rendering of charts.

pub mod ascii;

pub use ascii::render_chart;
