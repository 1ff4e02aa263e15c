//! Directory helpers shared by the evaluators

use crate::MetricsError;
use std::fs;
use std::path::{Path, PathBuf};

/// A ground-truth file and the same-named prediction file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    /// File name shared by both sides
    pub name: String,
    /// Ground-truth path
    pub truth: PathBuf,
    /// Prediction path
    pub prediction: PathBuf,
}

/// Pair every file in `truth_dir` with the same-named file in `prediction_dir`
///
/// Files without a counterpart are left out. Pairs are sorted by name.
pub fn paired_files(truth_dir: &Path, prediction_dir: &Path) -> Result<Vec<FilePair>, MetricsError> {
    let mut pairs = Vec::new();
    for entry in read_dir(truth_dir)? {
        let truth = entry?.path();
        if !truth.is_file() {
            continue;
        }
        let Some(name) = truth.file_name() else { continue };
        let prediction = prediction_dir.join(name);
        if prediction.is_file() {
            pairs.push(FilePair {
                name: name.to_string_lossy().into_owned(),
                truth,
                prediction,
            });
        }
    }
    pairs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pairs)
}

/// Number of `.txt` files (extension compared case-insensitively) in `dir`
pub fn count_txt_files(dir: &Path) -> Result<usize, MetricsError> {
    Ok(txt_files(dir)?.len())
}

/// `.txt` files directly inside `dir`, sorted
pub fn txt_files(dir: &Path) -> Result<Vec<PathBuf>, MetricsError> {
    let mut files = Vec::new();
    for entry in read_dir(dir)? {
        let path = entry?.path();
        let is_txt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_txt && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// First line of a file, trimmed
pub fn first_line(path: &Path) -> Result<String, MetricsError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| MetricsError::Io(format!("{}: {}", path.display(), e)))?;
    Ok(contents.lines().next().unwrap_or("").trim().to_string())
}

fn read_dir(dir: &Path) -> Result<fs::ReadDir, MetricsError> {
    fs::read_dir(dir).map_err(|e| MetricsError::Io(format!("{}: {}", dir.display(), e)))
}
