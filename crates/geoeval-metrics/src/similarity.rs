//! Semantic similarity between ground-truth and predicted descriptions
//!
//! Each side of a name-matched `.txt` pair is embedded with an
//! [`EmbeddingProvider`] and the pair is scored by cosine similarity.

use crate::files::paired_files;
use crate::MetricsError;
use geoeval_domain::EmbeddingProvider;
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Mean cosine similarity over the evaluated pairs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityReport {
    /// Pairs that were embedded and scored
    pub evaluated: usize,
    /// Pairs skipped because a side was empty or could not be embedded
    pub skipped: usize,
    /// Mean similarity of the evaluated pairs
    pub mean: f64,
}

/// Cosine similarity of two vectors
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Score every `.txt` file in `truth_dir` against its namesake in `prediction_dir`
pub fn evaluate_similarity<E>(
    embedder: &E,
    truth_dir: &Path,
    prediction_dir: &Path,
) -> Result<SimilarityReport, MetricsError>
where
    E: EmbeddingProvider + ?Sized,
    E::Error: Display,
{
    let mut total = 0.0;
    let mut evaluated = 0;
    let mut skipped = 0;

    let pairs = paired_files(truth_dir, prediction_dir)?
        .into_iter()
        .filter(|pair| pair.name.to_ascii_lowercase().ends_with(".txt"));

    for pair in pairs {
        let truth = fs::read_to_string(&pair.truth)?;
        let prediction = fs::read_to_string(&pair.prediction)?;
        if truth.trim().is_empty() || prediction.trim().is_empty() {
            debug!("Skipping {}: empty text", pair.name);
            skipped += 1;
            continue;
        }

        let embedded = embedder
            .embed(truth.trim())
            .and_then(|t| embedder.embed(prediction.trim()).map(|p| (t, p)));
        match embedded {
            Ok((t, p)) => {
                total += f64::from(cosine_similarity(&t, &p));
                evaluated += 1;
            }
            Err(e) => {
                warn!("Skipping {}: embedding failed: {}", pair.name, e);
                skipped += 1;
            }
        }
    }

    if evaluated == 0 {
        return Err(MetricsError::Empty(format!(
            "no comparable texts in {} and {}",
            truth_dir.display(),
            prediction_dir.display()
        )));
    }

    Ok(SimilarityReport {
        evaluated,
        skipped,
        mean: total / evaluated as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Letter-frequency embedder; texts containing "fail" are rejected
    struct LetterEmbedder;

    impl EmbeddingProvider for LetterEmbedder {
        type Error = String;

        fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
            if text.contains("fail") {
                return Err("refused".to_string());
            }
            let mut counts = vec![0.0f32; 26];
            for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
                counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
            }
            Ok(counts)
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_evaluate_similarity() {
        let truth = tempfile::tempdir().unwrap();
        let pred = tempfile::tempdir().unwrap();

        fs::write(truth.path().join("a.txt"), "abc").unwrap();
        fs::write(pred.path().join("a.txt"), "abc\n").unwrap();
        fs::write(truth.path().join("b.txt"), "a").unwrap();
        fs::write(pred.path().join("b.txt"), "b").unwrap();
        // Skipped: embedding refused, empty prediction, no counterpart
        fs::write(truth.path().join("c.txt"), "fail").unwrap();
        fs::write(pred.path().join("c.txt"), "ok").unwrap();
        fs::write(truth.path().join("d.txt"), "text").unwrap();
        fs::write(pred.path().join("d.txt"), "  ").unwrap();
        fs::write(truth.path().join("e.txt"), "alone").unwrap();

        let report = evaluate_similarity(&LetterEmbedder, truth.path(), pred.path()).unwrap();
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped, 2);
        assert!((report.mean - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nothing_comparable() {
        let truth = tempfile::tempdir().unwrap();
        let pred = tempfile::tempdir().unwrap();
        fs::write(truth.path().join("a.txt"), "fail").unwrap();
        fs::write(pred.path().join("a.txt"), "fail").unwrap();

        let result = evaluate_similarity(&LetterEmbedder, truth.path(), pred.path());
        assert!(matches!(result, Err(MetricsError::Empty(_))));
    }
}
