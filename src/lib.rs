//! `hkma-series` library crate.
//!
//! Fetches time series from the HKMA public statistics API, normalizes them
//! into a dated table, splits the selected variables between a left
//! (magnitude) and a right (rate) axis, and renders the result.
//!
//! The binary (`hks`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes or touching the network
//! - the CLI and the TUI share one fetch/normalize pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chart;
pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod range;
pub mod report;
pub mod session;
pub mod tui;
