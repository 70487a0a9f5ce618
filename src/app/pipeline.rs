//! Shared "fetch pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! registry lookup -> paginated fetch (memoized) -> normalization -> outcome
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::NaiveDate;
use tracing::info;

use crate::data::{FetchCache, FetchQuery, PageSource, fetch_cached};
use crate::domain::SourceConfig;
use crate::error::{SchemaError, TransportError};
use crate::io::normalize::{NormalizeReport, Normalized, candidate_date_fields, normalize};

/// What the fetch loop did, independent of normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub records: usize,
    pub pages: usize,
    pub from_cache: bool,
}

/// Result of one explicit fetch request.
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// At least one usable row. `interrupted` marks a partial result.
    Loaded {
        normalized: Normalized,
        stats: FetchStats,
        interrupted: Option<TransportError>,
    },
    /// The request worked but nothing falls in the window.
    Empty {
        report: NormalizeReport,
        stats: FetchStats,
        interrupted: Option<TransportError>,
    },
    /// The first page already failed.
    Failed(TransportError),
    /// Records came back without a recognizable date field.
    Schema(SchemaError),
}

/// Fetch and normalize one source over `[start, end]`.
pub fn run_fetch<P: PageSource + ?Sized>(
    pages: &P,
    cache: &mut FetchCache,
    source: &SourceConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> FetchStatus {
    // 1) Paginated fetch (or memo hit).
    let query = FetchQuery::for_source(source, start, end);
    let outcome = fetch_cached(pages, cache, &query);
    let stats = FetchStats {
        records: outcome.records.len(),
        pages: outcome.pages,
        from_cache: outcome.from_cache,
    };

    if outcome.records.is_empty() {
        if let Some(err) = outcome.interrupted {
            return FetchStatus::Failed(err);
        }
    }

    // 2) Normalize against the source's date field candidates.
    let candidates = candidate_date_fields(source.date_field);
    let normalized = match normalize(&outcome.records, &candidates, start, end) {
        Ok(n) => n,
        Err(err) => return FetchStatus::Schema(err),
    };

    info!(
        source = source.id.slug(),
        records = stats.records,
        rows = normalized.dataset.len(),
        complete = outcome.interrupted.is_none(),
        "fetch finished"
    );

    if normalized.dataset.is_empty() {
        return FetchStatus::Empty {
            report: normalized.report,
            stats,
            interrupted: outcome.interrupted,
        };
    }

    FetchStatus::Loaded {
        normalized,
        stats,
        interrupted: outcome.interrupted,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::data::PageRequest;
    use crate::domain::{RawRecord, SourceId};

    /// Serves a fixed list of pages, then empty pages.
    struct Pages(RefCell<Vec<Result<Vec<RawRecord>, TransportError>>>);

    impl PageSource for Pages {
        fn fetch_page(&self, _request: &PageRequest<'_>) -> Result<Vec<RawRecord>, TransportError> {
            let mut pages = self.0.borrow_mut();
            if pages.is_empty() {
                Ok(Vec::new())
            } else {
                pages.remove(0)
            }
        }
    }

    fn rec(date: &str) -> RawRecord {
        let mut r = RawRecord::new();
        r.insert("end_of_day".to_string(), json!(date));
        r.insert("ir_1m".to_string(), json!(4.0));
        r
    }

    fn failure() -> TransportError {
        TransportError::Request {
            url: "https://example.invalid".to_string(),
            message: "timed out".to_string(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn run(pages: Vec<Result<Vec<RawRecord>, TransportError>>) -> FetchStatus {
        let src = Pages(RefCell::new(pages));
        let mut cache = FetchCache::new();
        run_fetch(&src, &mut cache, &SourceId::Hibor.config(), d(2023, 1, 1), d(2023, 12, 31))
    }

    #[test]
    fn loaded_when_rows_remain() {
        let status = run(vec![Ok(vec![rec("2023-02-01"), rec("2023-01-15")])]);
        let FetchStatus::Loaded { normalized, stats, interrupted } = status else {
            panic!("expected Loaded");
        };
        assert_eq!(normalized.dataset.len(), 2);
        assert_eq!(stats.pages, 1);
        assert!(interrupted.is_none());
    }

    #[test]
    fn failed_when_first_page_errors() {
        let status = run(vec![Err(failure())]);
        assert!(matches!(status, FetchStatus::Failed(_)));
    }

    #[test]
    fn partial_result_is_loaded_with_interruption() {
        let status = run(vec![Ok(vec![rec("2023-02-01")]), Err(failure())]);
        let FetchStatus::Loaded { interrupted, .. } = status else {
            panic!("expected Loaded");
        };
        assert_eq!(interrupted, Some(failure()));
    }

    #[test]
    fn empty_when_nothing_in_window() {
        assert!(matches!(run(vec![]), FetchStatus::Empty { .. }));
        let status = run(vec![Ok(vec![rec("2021-02-01")])]);
        let FetchStatus::Empty { report, .. } = status else {
            panic!("expected Empty");
        };
        assert_eq!(report.dropped_out_of_range, 1);
    }

    #[test]
    fn schema_error_when_no_date_field() {
        let mut r = RawRecord::new();
        r.insert("ir_1m".to_string(), json!(4.0));
        assert!(matches!(run(vec![Ok(vec![r])]), FetchStatus::Schema(_)));
    }
}
