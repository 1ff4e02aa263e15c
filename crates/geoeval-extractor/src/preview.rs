//! Peek at the head of a CSV file

use crate::error::ExtractorError;
use crate::types::OutputTable;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default number of records shown
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Read the header and the first `rows` records of a CSV stream
///
/// Only the requested records are read, so previewing a huge export is cheap.
pub fn preview<R: Read>(reader: R, rows: usize) -> Result<OutputTable, ExtractorError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.iter().map(str::to_string).collect();
    let mut table = OutputTable::new(headers);
    for record in csv_reader.records().take(rows) {
        table.rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// Preview the CSV file at `path`
pub fn preview_path<P: AsRef<Path>>(path: P, rows: usize) -> Result<OutputTable, ExtractorError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ExtractorError::OpenInput(path.display().to_string(), e.to_string()))?;
    preview(file, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_takes_first_rows() {
        let input = "id,data\n1,a\n2,b\n3,c\n";
        let table = preview(input.as_bytes(), 2).unwrap();
        assert_eq!(table.headers, vec!["id", "data"]);
        assert_eq!(table.rows, vec![vec!["1", "a"], vec!["2", "b"]]);
    }

    #[test]
    fn test_preview_short_file() {
        let table = preview("id\n1\n".as_bytes(), DEFAULT_PREVIEW_ROWS).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_preview_missing_file() {
        let result = preview_path("/nonexistent/preview.csv", 5);
        assert!(matches!(result, Err(ExtractorError::OpenInput(_, _))));
    }
}
