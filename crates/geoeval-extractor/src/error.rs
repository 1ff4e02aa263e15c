//! Error types for the Extractor

use thiserror::Error;

/// Fatal errors that abort a scan
///
/// Per-record problems (bad JSON, missing column, non-object rounds) are not
/// errors: they skip the record and are reported through `ScanObserver`.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The input file could not be opened
    #[error("Cannot open input '{0}': {1}")]
    OpenInput(String, String),

    /// The input stream failed mid-read
    #[error("Read error: {0}")]
    Read(String),

    /// CSV structure could not be parsed (header row, or a previewed record)
    #[error("CSV error: {0}")]
    Csv(String),

    /// The output table could not be written
    #[error("Cannot write output '{0}': {1}")]
    Output(String, String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for ExtractorError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            ExtractorError::Read(e.to_string())
        } else {
            ExtractorError::Csv(e.to_string())
        }
    }
}

impl From<std::io::Error> for ExtractorError {
    fn from(e: std::io::Error) -> Self {
        ExtractorError::Read(e.to_string())
    }
}
