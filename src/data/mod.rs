//! Remote data access: source registry, paginated fetcher, fetch memo.

pub mod cache;
pub mod hkma;
pub mod registry;

pub use cache::{FetchCache, fetch_cached};
pub use hkma::{FetchOutcome, FetchQuery, HkmaClient, PAGE_SIZE, PageRequest, PageSource, fetch_records};
pub use registry::SourceRegistry;
