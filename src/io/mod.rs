//! Input/output helpers.
//!
//! - API record normalization into a dated table (`normalize`)
//! - variable metadata CSV loading (`meta`)
//! - dataset CSV exports (`export`)

pub mod export;
pub mod meta;
pub mod normalize;

pub use export::*;
pub use meta::*;
pub use normalize::*;
