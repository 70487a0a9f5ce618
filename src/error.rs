//! Error types.
//!
//! `AppError` is what the binary sees: a message plus a process exit code.
//! Each pipeline stage reports its own typed error so callers can tell the
//! failure classes apart (a broken transport is not the same thing as a
//! missing date column, and neither is an empty result).
//!
//! Exit codes:
//! - 2: usage, configuration, local file I/O
//! - 3: no usable data (schema problems, empty ranges)
//! - 4: network / terminal failures

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A page request failed; the fetch loop stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {message}")]
    Shape { url: String, message: String },
}

/// The fetched records could not be turned into a dated table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("no date field found (tried: {}); available columns: {}", .tried.join(", "), .available.join(", "))]
    NoDateField {
        tried: Vec<String>,
        available: Vec<String>,
    },
}

/// A user-supplied range was rejected. The previous range stays in effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("{date} is outside the loaded data ({min} to {max})")]
    OutOfSpan {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("invalid date '{input}' (expected YYYY-MM-DD)")]
    Unparseable { input: String },

    #[error("no data loaded; fetch before setting the plotted range")]
    NoRange,
}

/// Nothing drawable for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no data loaded")]
    NoDataset,

    #[error("no data in this sub-range ({start} to {end})")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("select at least one variable to plot")]
    NoVariables,
}

/// The variable metadata table exists but cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error("failed to read variable metadata '{path}': {message}")]
    Read { path: String, message: String },

    #[error("variable metadata '{path}' is missing required column `{column}`")]
    MissingColumn { path: String, column: &'static str },
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::new(4, err.to_string())
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<MetaError> for AppError {
    fn from(err: MetaError) -> Self {
        AppError::new(2, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_available_columns() {
        let err = SchemaError::NoDateField {
            tried: vec!["end_of_day".to_string(), "date".to_string()],
            available: vec!["ir_1m".to_string(), "ir_3m".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("end_of_day, date"), "{msg}");
        assert!(msg.contains("ir_1m, ir_3m"), "{msg}");

        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 3);
    }

    #[test]
    fn transport_errors_map_to_network_exit_code() {
        let app: AppError = TransportError::Status {
            url: "https://example.invalid".to_string(),
            status: 503,
        }
        .into();
        assert_eq!(app.exit_code(), 4);
        assert!(app.to_string().contains("503"));
    }
}
