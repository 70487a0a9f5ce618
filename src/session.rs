//! Per-session state.
//!
//! One `Session` owns everything that changes while the tool runs: the
//! selected source, the fetch window, the loaded dataset, the plot range and
//! the variable selection. It is created at start-up, passed by `&mut` to
//! whatever handles user input, and dropped on exit.
//!
//! Failed fetches never touch the loaded dataset.

use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::app::pipeline::{FetchStatus, run_fetch};
use crate::chart::{ChartModel, render};
use crate::classify::{candidate_columns, classify};
use crate::data::{FetchCache, PageSource, SourceRegistry};
use crate::domain::{AxisPartition, Dataset, RangeState, Row, SourceId, VariableMeta};
use crate::error::{RenderError, ValidationError};
use crate::io::normalize::NormalizeReport;
use crate::range::{Bound, RangeSync};

/// How many variables are pre-selected after a new dataset loads.
const DEFAULT_SELECTION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Default fetch window: 1 January of last year through `today`.
pub fn default_window(today: NaiveDate) -> RangeState {
    let start = NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).unwrap_or(today);
    RangeState { start, end: today }
}

#[derive(Debug)]
pub struct Session {
    source: SourceId,
    window: RangeState,
    dataset: Option<Dataset>,
    range: Option<RangeSync>,
    selected: Vec<String>,
    cache: FetchCache,
    last_report: Option<NormalizeReport>,
}

impl Session {
    pub fn new(source: SourceId, window: RangeState) -> Self {
        Self {
            source,
            window,
            dataset: None,
            range: None,
            selected: Vec::new(),
            cache: FetchCache::new(),
            last_report: None,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// The fetch window (what gets requested from the API).
    pub fn window(&self) -> RangeState {
        self.window
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn range(&self) -> Option<&RangeSync> {
        self.range.as_ref()
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn last_report(&self) -> Option<&NormalizeReport> {
        self.last_report.as_ref()
    }

    /// Switch source. The current dataset belongs to the old source and is
    /// discarded. Returns false when `source` is already selected.
    pub fn set_source(&mut self, source: SourceId) -> bool {
        if source == self.source {
            return false;
        }
        info!(from = self.source.slug(), to = source.slug(), "switching source");
        self.source = source;
        self.dataset = None;
        self.range = None;
        self.selected.clear();
        self.last_report = None;
        true
    }

    /// Edit one end of the fetch window.
    pub fn set_window_bound(&mut self, bound: Bound) -> Result<(), ValidationError> {
        let next = match bound {
            Bound::Start(start) => RangeState { start, ..self.window },
            Bound::End(end) => RangeState { end, ..self.window },
        };
        if next.start > next.end {
            return Err(ValidationError::StartAfterEnd { start: next.start, end: next.end });
        }
        self.window = next;
        Ok(())
    }

    /// Fetch the current source over the current window and apply the result.
    pub fn fetch<P: PageSource + ?Sized>(&mut self, pages: &P, registry: &SourceRegistry) -> Notice {
        let status = run_fetch(
            pages,
            &mut self.cache,
            registry.get(self.source),
            self.window.start,
            self.window.end,
        );
        self.apply_fetch(status)
    }

    /// Apply a fetch outcome. Only a non-empty result replaces the dataset.
    pub fn apply_fetch(&mut self, status: FetchStatus) -> Notice {
        match status {
            FetchStatus::Loaded { normalized, stats, interrupted } => {
                let rows = normalized.dataset.len();
                let dropped = normalized.report.dropped_unparseable;
                self.last_report = Some(normalized.report);
                self.load_dataset(normalized.dataset);

                let mut message = format!("Loaded {rows} rows");
                if stats.from_cache {
                    message.push_str(" (cached)");
                }
                if dropped > 0 {
                    message.push_str(&format!(", skipped {dropped} with unreadable dates"));
                }
                match interrupted {
                    Some(err) => Notice::warning(format!(
                        "{message}. Results may be incomplete: {err}"
                    )),
                    None => Notice::info(format!("{message}.")),
                }
            }
            FetchStatus::Empty { interrupted, .. } => match interrupted {
                Some(err) => Notice::warning(format!(
                    "No data in the requested range (fetch interrupted: {err})."
                )),
                None => Notice::info("No data in the requested range."),
            },
            FetchStatus::Failed(err) => Notice::error(format!("Fetch failed: {err}")),
            FetchStatus::Schema(err) => Notice::error(format!("Unusable response: {err}")),
        }
    }

    /// Replace the dataset wholesale and rebase range + selection onto it.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        match (dataset.span(), self.range.as_mut()) {
            (Some(span), Some(range)) => range.on_dataset(span),
            (Some(span), None) => self.range = Some(RangeSync::new(span)),
            (None, _) => self.range = None,
        }
        self.selected = candidate_columns(&dataset)
            .into_iter()
            .take(DEFAULT_SELECTION)
            .collect();
        self.dataset = Some(dataset);
    }

    /// Columns the user may plot.
    pub fn available_variables(&self) -> Vec<String> {
        self.dataset.as_ref().map(candidate_columns).unwrap_or_default()
    }

    /// Add or remove `column`; the selection keeps dataset column order.
    pub fn toggle_variable(&mut self, column: &str) {
        let available = self.available_variables();
        if !available.iter().any(|c| c == column) {
            return;
        }
        let was_selected = self.selected.iter().any(|c| c == column);
        self.selected = available
            .into_iter()
            .filter(|c| {
                if c == column {
                    !was_selected
                } else {
                    self.selected.contains(c)
                }
            })
            .collect();
    }

    /// Replace the selection, ignoring unknown columns.
    pub fn set_selected(&mut self, columns: &[String]) {
        let available = self.available_variables();
        self.selected = columns
            .iter()
            .filter(|c| available.contains(c))
            .cloned()
            .collect();
    }

    /// Bound-input channel.
    pub fn apply_bound(&mut self, bound: Bound) -> Result<(), ValidationError> {
        match self.range.as_mut() {
            Some(range) => range.on_bound(bound),
            None => Err(ValidationError::NoRange),
        }
    }

    /// Interval channel.
    pub fn apply_interval(&mut self, start: NaiveDate, end: NaiveDate) {
        if let Some(range) = self.range.as_mut() {
            range.on_interval(start, end);
        }
    }

    pub fn range_mut(&mut self) -> Option<&mut RangeSync> {
        self.range.as_mut()
    }

    pub fn partition(&self, meta: &VariableMeta) -> AxisPartition {
        classify(&self.selected, meta)
    }

    /// Rows inside the current plot range.
    pub fn selected_rows(&self) -> &[Row] {
        match (&self.dataset, &self.range) {
            (Some(ds), Some(range)) => {
                let state = range.state();
                ds.rows_between(state.start, state.end)
            }
            _ => &[],
        }
    }

    /// Chart for the current selection and plot range.
    pub fn chart(&self, meta: &VariableMeta, registry: &SourceRegistry) -> Result<ChartModel, RenderError> {
        let (Some(dataset), Some(range)) = (&self.dataset, &self.range) else {
            return Err(RenderError::NoDataset);
        };
        let partition = self.partition(meta);
        render(
            dataset,
            &range.state(),
            &self.selected,
            &partition,
            meta,
            registry.get(self.source).title,
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::RawRecord;
    use crate::io::normalize::normalize;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dataset(dates: &[&str]) -> Dataset {
        let records: Vec<RawRecord> = dates
            .iter()
            .map(|date| {
                let mut r = RawRecord::new();
                r.insert("end_of_day".to_string(), json!(date));
                r.insert("ir_overnight".to_string(), json!(3.9));
                r.insert("ir_1m".to_string(), json!(4.1));
                r.insert("ir_3m".to_string(), json!(4.5));
                r
            })
            .collect();
        normalize(&records, &["end_of_day"], d(2000, 1, 1), d(2100, 1, 1))
            .unwrap()
            .dataset
    }

    fn session() -> Session {
        Session::new(SourceId::Hibor, RangeState { start: d(2023, 1, 1), end: d(2023, 12, 31) })
    }

    #[test]
    fn default_window_starts_last_january() {
        let w = default_window(d(2024, 8, 15));
        assert_eq!(w, RangeState { start: d(2023, 1, 1), end: d(2024, 8, 15) });
    }

    #[test]
    fn loading_selects_first_two_variables_and_full_span() {
        let mut s = session();
        s.load_dataset(dataset(&["2023-01-03", "2023-06-30"]));
        assert_eq!(s.selected(), &["ir_overnight".to_string(), "ir_1m".to_string()]);
        let state = s.range().unwrap().state();
        assert_eq!(state, RangeState { start: d(2023, 1, 3), end: d(2023, 6, 30) });
    }

    #[test]
    fn failed_fetch_keeps_previous_dataset() {
        let mut s = session();
        s.load_dataset(dataset(&["2023-01-03", "2023-06-30"]));
        let before = s.dataset().cloned();

        let notice = s.apply_fetch(FetchStatus::Failed(crate::error::TransportError::Status {
            url: "u".to_string(),
            status: 502,
        }));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(s.dataset().cloned(), before);
    }

    #[test]
    fn switching_source_discards_dataset() {
        let mut s = session();
        s.load_dataset(dataset(&["2023-01-03"]));
        assert!(!s.set_source(SourceId::Hibor));
        assert!(s.set_source(SourceId::MoneySupply));
        assert!(s.dataset().is_none());
        assert!(s.range().is_none());
        assert!(s.selected().is_empty());
        assert!(matches!(
            s.chart(&VariableMeta::empty(), &SourceRegistry::builtin()),
            Err(RenderError::NoDataset)
        ));
    }

    #[test]
    fn toggling_keeps_column_order() {
        let mut s = session();
        s.load_dataset(dataset(&["2023-01-03"]));
        s.toggle_variable("ir_overnight");
        s.toggle_variable("ir_3m");
        assert_eq!(s.selected(), &["ir_1m".to_string(), "ir_3m".to_string()]);
        s.toggle_variable("ir_overnight");
        assert_eq!(s.selected().len(), 3);
        assert_eq!(s.selected()[0], "ir_overnight");
        s.toggle_variable("unknown");
        assert_eq!(s.selected().len(), 3);
    }

    #[test]
    fn window_edits_are_validated() {
        let mut s = session();
        let err = s.set_window_bound(Bound::Start(d(2024, 1, 1))).unwrap_err();
        assert!(matches!(err, ValidationError::StartAfterEnd { .. }));
        assert_eq!(s.window().start, d(2023, 1, 1));
        s.set_window_bound(Bound::End(d(2023, 3, 31))).unwrap();
        assert_eq!(s.window().end, d(2023, 3, 31));
    }

    #[test]
    fn bound_edit_without_data_is_rejected() {
        let mut s = session();
        let err = s.apply_bound(Bound::Start(d(2023, 6, 1))).unwrap_err();
        assert_eq!(err, ValidationError::NoRange);
        assert!(s.range().is_none());
    }

    #[test]
    fn reload_rebases_plot_range() {
        let mut s = session();
        s.load_dataset(dataset(&["2023-01-03", "2023-12-29"]));
        s.apply_bound(Bound::Start(d(2023, 6, 1))).unwrap();
        s.load_dataset(dataset(&["2023-03-01", "2023-09-30"]));
        let state = s.range().unwrap().state();
        assert_eq!(state, RangeState { start: d(2023, 6, 1), end: d(2023, 9, 30) });
    }

    #[test]
    fn chart_uses_source_title_and_range() {
        let mut s = session();
        s.load_dataset(dataset(&["2023-01-03", "2023-01-04"]));
        let model = s.chart(&VariableMeta::empty(), &SourceRegistry::builtin()).unwrap();
        assert_eq!(model.title, "HIBOR Fixings (2023-01-03 to 2023-01-04)");
        assert_eq!(s.selected_rows().len(), 2);
    }
}
