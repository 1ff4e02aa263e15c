//! Scan results and the output table

use crate::error::ExtractorError;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Counters collected during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Data records read from the input
    pub records_read: u64,

    /// Records skipped for structural problems
    pub records_skipped: u64,

    /// Records whose payload decoded
    pub payloads_decoded: u64,

    /// Rounds inspected across all decoded payloads
    pub rounds_seen: u64,

    /// Candidates retained in the output
    pub candidates_retained: usize,

    /// The scan stopped because every quota was filled
    pub stopped_early: bool,

    /// The scan stopped because the observer asked it to
    pub cancelled: bool,

    /// Keys of interest still below quota when the scan ended
    pub unfilled_keys: Vec<String>,

    /// Wall-clock scan time in milliseconds
    pub elapsed_ms: u64,
}

/// Result of a scan: the collected rows plus statistics
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Collected rows
    pub table: OutputTable,

    /// Scan statistics
    pub stats: ScanStats,
}

/// A flat table of `(key, values...)` rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTable {
    /// Column headers, key column first
    pub headers: Vec<String>,

    /// Rows grouped by key in first-encounter order
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// Create an empty table with the given headers
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose key column equals `key`
    pub fn rows_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Vec<String>> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.first().map(String::as_str) == Some(key))
    }

    /// Write the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file, replacing any existing file
    pub fn write_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ExtractorError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| output_error(path, e))?;
        self.write_csv(file).map_err(|e| output_error(path, e))
    }

    /// Render the table as a CSV string
    pub fn to_csv_string(&self) -> Result<String, ExtractorError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)
            .map_err(|e| ExtractorError::Output("<memory>".to_string(), e.to_string()))?;
        String::from_utf8(buffer)
            .map_err(|e| ExtractorError::Output("<memory>".to_string(), e.to_string()))
    }
}

fn output_error(path: &Path, e: impl std::fmt::Display) -> ExtractorError {
    ExtractorError::Output(path.display().to_string(), e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OutputTable {
        OutputTable {
            headers: vec!["nation".to_string(), "panoID".to_string()],
            rows: vec![
                vec!["Japan".to_string(), "a".to_string()],
                vec!["Peru".to_string(), "b,c".to_string()],
                vec!["Japan".to_string(), "d".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_quotes_separators() {
        let csv = table().to_csv_string().unwrap();
        assert_eq!(csv, "nation,panoID\nJapan,a\nPeru,\"b,c\"\nJapan,d\n");
    }

    #[test]
    fn test_rows_for_key() {
        let table = table();
        assert_eq!(table.rows_for("Japan").count(), 2);
        assert_eq!(table.rows_for("Chile").count(), 0);
    }

    #[test]
    fn test_header_only_table() {
        let table = OutputTable::new(vec!["nation".to_string()]);
        assert!(table.is_empty());
        assert_eq!(table.to_csv_string().unwrap(), "nation\n");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let result = table().write_path("/nonexistent-dir/out.csv");
        assert!(matches!(result, Err(ExtractorError::Output(_, _))));
    }
}
