//! Error types for the market forensics library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// The series for a ticker had no rows at all
    #[error("No data for {0}")]
    NoData(String),

    /// The data-retrieval collaborator failed
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// A required column was absent from a raw frame
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP-style status for a collaborator serving results over the wire
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NoData(_) => 404,
            _ => 500,
        }
    }

    /// Check if the error means "nothing to analyze" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoData(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::NoData("AAPL".to_string()).status_code(), 404);
        assert_eq!(Error::Upstream("timeout".to_string()).status_code(), 500);
        assert_eq!(Error::MissingColumn("Volume".to_string()).status_code(), 500);
    }

    #[test]
    fn test_upstream_carries_cause() {
        let err = Error::Upstream("connection reset".to_string());
        assert!(err.to_string().contains("connection reset"));
        assert!(!err.is_not_found());
    }
}
