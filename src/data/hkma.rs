//! Paginated retrieval from the HKMA public statistics API.
//!
//! The API pages with `pagesize`/`offset`. There is no reliable total-count
//! header, so the only stop signal is a page with zero records. The first
//! failed page ends the loop; whatever was collected before it is returned
//! together with the error.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{RawRecord, SourceConfig};
use crate::error::{AppError, TransportError};

/// Fixed page size for every request.
pub const PAGE_SIZE: usize = 1000;

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub endpoint: &'a str,
    pub segment: Option<&'a str>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub pagesize: usize,
    pub offset: usize,
}

impl PageRequest<'_> {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pagesize", self.pagesize.to_string()),
            ("offset", self.offset.to_string()),
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
        ];
        if let Some(segment) = self.segment {
            pairs.push(("segment", segment.to_string()));
        }
        pairs
    }
}

/// Anything that can serve one page of records.
pub trait PageSource {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRecord>, TransportError>;
}

/// The full input of one fetch. Also the memoization key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchQuery {
    pub endpoint: String,
    pub segment: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchQuery {
    pub fn for_source(cfg: &SourceConfig, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            endpoint: cfg.endpoint.to_string(),
            segment: cfg.segment.map(str::to_string),
            start,
            end,
        }
    }
}

/// Records collected by one fetch, in request order.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<RawRecord>,
    /// Number of non-empty pages consumed.
    pub pages: usize,
    /// Set when a page failed; `records` then holds only the earlier pages.
    pub interrupted: Option<TransportError>,
    pub from_cache: bool,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// Page through `query` until an empty page (or the first failure).
pub fn fetch_records<P: PageSource + ?Sized>(source: &P, query: &FetchQuery) -> FetchOutcome {
    let mut records = Vec::new();
    let mut pages = 0usize;
    let mut offset = 0usize;

    loop {
        let request = PageRequest {
            endpoint: &query.endpoint,
            segment: query.segment.as_deref(),
            from: query.start,
            to: query.end,
            pagesize: PAGE_SIZE,
            offset,
        };

        match source.fetch_page(&request) {
            Ok(page) if page.is_empty() => {
                debug!(offset, total = records.len(), "empty page, fetch complete");
                break;
            }
            Ok(page) => {
                debug!(offset, page_len = page.len(), "fetched page");
                records.extend(page);
                pages += 1;
                offset += PAGE_SIZE;
            }
            Err(err) => {
                warn!(offset, kept = records.len(), error = %err, "page request failed, stopping");
                return FetchOutcome {
                    records,
                    pages,
                    interrupted: Some(err),
                    from_cache: false,
                };
            }
        }
    }

    FetchOutcome {
        records,
        pages,
        interrupted: None,
        from_cache: false,
    }
}

/// Blocking HTTP client for the HKMA API.
pub struct HkmaClient {
    client: Client,
}

impl HkmaClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PageSource for HkmaClient {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRecord>, TransportError> {
        let url = request.endpoint.to_string();
        let resp = self
            .client
            .get(request.endpoint)
            .query(&request.query_pairs())
            .send()
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(TransportError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().map_err(|e| TransportError::Request {
            url: url.clone(),
            message: format!("failed to read body: {e}"),
        })?;

        parse_page(&url, &body)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: ApiResult,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    records: Vec<RawRecord>,
}

/// Extract `result.records` from a response body.
pub fn parse_page(url: &str, body: &str) -> Result<Vec<RawRecord>, TransportError> {
    let parsed: ApiResponse = serde_json::from_str(body).map_err(|e| TransportError::Shape {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed.result.records)
}
