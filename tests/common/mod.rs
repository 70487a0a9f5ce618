//! Shared fixtures for integration tests: a scripted page source and record builders.

#![allow(dead_code)]

use std::cell::RefCell;

use chrono::{Duration, NaiveDate};
use hkma_series::data::{PageRequest, PageSource};
use hkma_series::domain::RawRecord;
use hkma_series::error::TransportError;
use serde_json::{Value, json};

/// Serves pre-built pages in order, then empty pages, and remembers every
/// offset it was asked for.
pub struct ScriptedPages {
    pages: RefCell<Vec<Result<Vec<RawRecord>, TransportError>>>,
    offsets: RefCell<Vec<usize>>,
}

impl ScriptedPages {
    pub fn new(pages: Vec<Result<Vec<RawRecord>, TransportError>>) -> Self {
        Self {
            pages: RefCell::new(pages),
            offsets: RefCell::new(Vec::new()),
        }
    }

    /// Split `records` into pages of `page_size`.
    pub fn paged(records: Vec<RawRecord>, page_size: usize) -> Self {
        let pages = records.chunks(page_size).map(|c| Ok(c.to_vec())).collect();
        Self::new(pages)
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.offsets.borrow().clone()
    }
}

impl PageSource for ScriptedPages {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRecord>, TransportError> {
        self.offsets.borrow_mut().push(request.offset);
        let mut pages = self.pages.borrow_mut();
        if pages.is_empty() {
            Ok(Vec::new())
        } else {
            pages.remove(0)
        }
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn record(pairs: &[(&str, Value)]) -> RawRecord {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// One HIBOR-shaped record per day from `start`, `n` days.
pub fn daily_hibor(start: NaiveDate, n: usize) -> Vec<RawRecord> {
    (0..n)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            record(&[
                ("end_of_day", json!(date.format("%Y-%m-%d").to_string())),
                ("ir_overnight", json!(3.5 + (i % 10) as f64 * 0.01)),
                ("ir_1m", json!(4.1)),
                ("ir_3m", json!(4.6)),
            ])
        })
        .collect()
}

pub fn transport_failure() -> TransportError {
    TransportError::Request {
        url: "https://api.hkma.gov.hk/public/market-data-and-statistics/monthly-statistical-bulletin/er-ir/hk-interbank-ir-daily".to_string(),
        message: "connection reset".to_string(),
    }
}
