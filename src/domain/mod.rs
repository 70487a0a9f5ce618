//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source identifiers and their static configuration (`SourceId`, `SourceConfig`)
//! - raw and normalized records (`RawRecord`, `Dataset`, `Row`)
//! - chart-side state (`VariableMeta`, `AxisPartition`, `RangeState`)

pub mod types;

pub use types::*;
