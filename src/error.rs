//! Error types.
//!
//! - `TvlError` is the library taxonomy returned by fetch, ingest and reconstruction.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised while fetching, parsing or reconstructing TVL data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TvlError {
    /// The data source answered with a non-success status.
    #[error("Error fetching data: {status}")]
    Fetch { status: u16 },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Error fetching data: {0}")]
    Transport(String),

    #[error("Failed to parse protocol document: {0}")]
    Parse(String),

    #[error("No TVL data found for protocol {protocol}")]
    NoProtocolData { protocol: String },

    #[error("No TVL data available between {start} and {end}")]
    NoDataInRange { start: NaiveDate, end: NaiveDate },

    #[error("No valid chain data")]
    NoValidChains,

    #[error("No TVL data available for averaging")]
    NoDataForAverage,

    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("{0}")]
    Ingest(String),

    #[error("{0}")]
    Io(String),
}

/// Binary-facing error: what to print and which code to exit with.
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

impl From<TvlError> for AppError {
    fn from(err: TvlError) -> Self {
        AppError::new(1, format!("Error: {err}"))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_exit_code_one() {
        let err: AppError = TvlError::Fetch { status: 404 }.into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Error: Error fetching data: 404");
    }

    #[test]
    fn no_data_in_range_message_names_both_dates() {
        let err = TvlError::NoDataInRange {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "No TVL data available between 2025-01-01 and 2025-01-31"
        );
    }
}
