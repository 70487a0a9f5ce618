//! Single-entry memo for fetch results.
//!
//! Only the most recent complete fetch is kept. Any change to the query
//! (source endpoint, segment, window) is a miss and replaces the entry.

use tracing::debug;

use crate::data::hkma::{FetchOutcome, FetchQuery, PageSource, fetch_records};
use crate::domain::RawRecord;

#[derive(Debug, Default)]
pub struct FetchCache {
    entry: Option<(FetchQuery, Vec<RawRecord>)>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &FetchQuery) -> Option<&[RawRecord]> {
        match &self.entry {
            Some((key, records)) if key == query => Some(records),
            _ => None,
        }
    }

    pub fn store(&mut self, query: FetchQuery, records: Vec<RawRecord>) {
        self.entry = Some((query, records));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Fetch through the cache. Interrupted fetches are returned but not stored.
pub fn fetch_cached<P: PageSource + ?Sized>(
    source: &P,
    cache: &mut FetchCache,
    query: &FetchQuery,
) -> FetchOutcome {
    if let Some(records) = cache.get(query) {
        debug!(records = records.len(), "fetch served from cache");
        return FetchOutcome {
            records: records.to_vec(),
            pages: 0,
            interrupted: None,
            from_cache: true,
        };
    }

    let outcome = fetch_records(source, query);
    if outcome.is_complete() {
        cache.store(query.clone(), outcome.records.clone());
    } else {
        cache.clear();
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::data::hkma::PageRequest;
    use crate::error::TransportError;

    struct Counting {
        calls: Cell<usize>,
        fail: bool,
    }

    impl PageSource for Counting {
        fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRecord>, TransportError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(TransportError::Request {
                    url: request.endpoint.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            if request.offset > 0 {
                return Ok(Vec::new());
            }
            let mut rec = RawRecord::new();
            rec.insert("end_of_day".to_string(), json!("2023-01-03"));
            Ok(vec![rec])
        }
    }

    fn query(day: u32) -> FetchQuery {
        FetchQuery {
            endpoint: "https://example.invalid/api".to_string(),
            segment: Some("hibor.fixing".to_string()),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
        }
    }

    #[test]
    fn identical_query_hits_cache() {
        let src = Counting { calls: Cell::new(0), fail: false };
        let mut cache = FetchCache::new();

        let first = fetch_cached(&src, &mut cache, &query(31));
        assert!(!first.from_cache);
        assert_eq!(src.calls.get(), 2);

        let second = fetch_cached(&src, &mut cache, &query(31));
        assert!(second.from_cache);
        assert_eq!(second.records, first.records);
        assert_eq!(src.calls.get(), 2);
    }

    #[test]
    fn changed_window_invalidates() {
        let src = Counting { calls: Cell::new(0), fail: false };
        let mut cache = FetchCache::new();
        fetch_cached(&src, &mut cache, &query(31));
        let other = fetch_cached(&src, &mut cache, &query(30));
        assert!(!other.from_cache);
        assert!(cache.get(&query(31)).is_none());
        assert!(cache.get(&query(30)).is_some());
    }

    #[test]
    fn interrupted_fetch_is_not_cached() {
        let src = Counting { calls: Cell::new(0), fail: true };
        let mut cache = FetchCache::new();
        let out = fetch_cached(&src, &mut cache, &query(31));
        assert!(!out.is_complete());
        assert!(cache.get(&query(31)).is_none());
    }
}
