//! Error types for metric computation

use thiserror::Error;

/// Errors that can occur while computing metrics
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Reading an input directory or file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// An input could not be parsed
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Nothing was available to evaluate
    #[error("Nothing to evaluate: {0}")]
    Empty(String),
}

impl From<std::io::Error> for MetricsError {
    fn from(e: std::io::Error) -> Self {
        MetricsError::Io(e.to_string())
    }
}

impl From<csv::Error> for MetricsError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            MetricsError::Io(e.to_string())
        } else {
            MetricsError::InvalidFormat(e.to_string())
        }
    }
}
