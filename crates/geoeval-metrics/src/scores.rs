//! Column means over a directory of rubric score files

use crate::files::txt_files;
use crate::MetricsError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Number of rubric columns per score file
pub const SCORE_COLUMNS: usize = 4;

/// Mean of each rubric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreMeans {
    /// Column means in file order
    pub means: [f64; SCORE_COLUMNS],
    /// Files that contributed
    pub files: usize,
    /// Files ignored as empty or malformed
    pub ignored: usize,
}

/// Parse one score line: exactly four comma-separated numbers
pub fn parse_scores(line: &str) -> Option<[f64; SCORE_COLUMNS]> {
    let mut values = [0.0; SCORE_COLUMNS];
    let mut parts = line.split(',');
    for value in values.iter_mut() {
        *value = parts.next()?.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
    }
    parts.next().is_none().then_some(values)
}

/// Average every column across the `.txt` score files in `dir`
pub fn score_means(dir: &Path) -> Result<ScoreMeans, MetricsError> {
    let mut sums = [0.0; SCORE_COLUMNS];
    let mut files = 0;
    let mut ignored = 0;

    for path in txt_files(dir)? {
        let contents = fs::read_to_string(&path)?;
        match parse_scores(contents.trim()) {
            Some(values) => {
                for (sum, value) in sums.iter_mut().zip(values) {
                    *sum += value;
                }
                files += 1;
            }
            None => {
                debug!("Ignoring {}", path.display());
                ignored += 1;
            }
        }
    }

    if files == 0 {
        return Err(MetricsError::Empty(format!("no score files in {}", dir.display())));
    }

    Ok(ScoreMeans {
        means: sums.map(|sum| sum / files as f64),
        files,
        ignored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scores() {
        assert_eq!(parse_scores("5,2.5,4, 1"), Some([5.0, 2.5, 4.0, 1.0]));
        assert_eq!(parse_scores("5,2.5,4"), None);
        assert_eq!(parse_scores("5,2.5,4,1,3"), None);
        assert_eq!(parse_scores("5,unscored,4,1"), None);
        assert_eq!(parse_scores(""), None);
    }

    #[test]
    fn test_score_means() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "5,4,3,2\n").unwrap();
        fs::write(dir.path().join("b.txt"), "1,2,3,4").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();
        fs::write(dir.path().join("d.txt"), "5,unscored,5,5").unwrap();
        fs::write(dir.path().join("e.csv"), "9,9,9,9").unwrap();

        let means = score_means(dir.path()).unwrap();
        assert_eq!(means.means, [3.0, 3.0, 3.0, 3.0]);
        assert_eq!(means.files, 2);
        assert_eq!(means.ignored, 2);
    }

    #[test]
    fn test_no_scores_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(score_means(dir.path()), Err(MetricsError::Empty(_))));
    }
}
