//! Location / country / continent classification metrics

use crate::files::{first_line, paired_files};
use crate::MetricsError;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Value written when a field could not be predicted
pub const NONE_LABEL: &str = "none";

/// A `location, country, continent` answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationTriple {
    /// Free-form place name; may itself contain commas
    pub location: String,
    /// Country name
    pub country: String,
    /// Continent name
    pub continent: String,
}

impl LocationTriple {
    /// Create a triple
    pub fn new(
        location: impl Into<String>,
        country: impl Into<String>,
        continent: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            country: country.into(),
            continent: continent.into(),
        }
    }

    /// Parse `location, country, continent`
    ///
    /// The line is split from the right on `", "`, so only the last two
    /// separators matter and the location keeps any inner commas.
    pub fn parse(line: &str) -> Result<Self, MetricsError> {
        let mut parts = line.rsplitn(3, ", ");
        match (parts.next(), parts.next(), parts.next()) {
            (Some(continent), Some(country), Some(location)) => {
                Ok(Self::new(location, country, continent))
            }
            _ => Err(MetricsError::InvalidFormat(format!(
                "expected 'location, country, continent' but got '{}'",
                line
            ))),
        }
    }
}

impl fmt::Display for LocationTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.location, self.country, self.continent)
    }
}

/// Accuracy, macro recall and macro F1 for one field, rounded to 3 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldMetrics {
    /// Fraction of exact matches
    pub accuracy: f64,
    /// Unweighted mean of per-label recall
    pub recall: f64,
    /// Unweighted mean of per-label F1
    pub f1_score: f64,
}

/// Metrics for all three fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Pairs that parsed on both sides
    pub evaluated: usize,
    /// Pairs dropped for bad formatting
    pub skipped: usize,
    /// Location metrics
    pub location: FieldMetrics,
    /// Country metrics
    pub country: FieldMetrics,
    /// Continent metrics
    pub continent: FieldMetrics,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Compute metrics for parallel label sequences
///
/// Labels are the union of both sequences. A label with no support or no
/// predictions contributes 0 to the macro averages instead of failing.
pub fn field_metrics<S: AsRef<str>>(truth: &[S], predicted: &[S]) -> Result<FieldMetrics, MetricsError> {
    if truth.len() != predicted.len() {
        return Err(MetricsError::InvalidFormat(format!(
            "{} ground-truth labels but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    if truth.is_empty() {
        return Err(MetricsError::Empty("no labels to score".to_string()));
    }

    #[derive(Default)]
    struct Counts {
        true_positive: usize,
        support: usize,
        predicted: usize,
    }

    let mut counts: HashMap<&str, Counts> = HashMap::new();
    let mut labels = BTreeSet::new();
    let mut correct = 0;
    for (t, p) in truth.iter().zip(predicted) {
        let (t, p) = (t.as_ref(), p.as_ref());
        labels.insert(t);
        labels.insert(p);
        counts.entry(t).or_default().support += 1;
        counts.entry(p).or_default().predicted += 1;
        if t == p {
            correct += 1;
            counts.entry(t).or_default().true_positive += 1;
        }
    }

    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;
    for label in &labels {
        let Some(c) = counts.get(label) else { continue };
        let recall = ratio(c.true_positive, c.support);
        let precision = ratio(c.true_positive, c.predicted);
        recall_sum += recall;
        if precision + recall > 0.0 {
            f1_sum += 2.0 * precision * recall / (precision + recall);
        }
    }

    let n = labels.len() as f64;
    Ok(FieldMetrics {
        accuracy: round3(ratio(correct, truth.len())),
        recall: round3(recall_sum / n),
        f1_score: round3(f1_sum / n),
    })
}

/// Build a report from parsed pairs
pub fn classify(pairs: &[(LocationTriple, LocationTriple)], skipped: usize) -> Result<ClassificationReport, MetricsError> {
    let mut columns: [(Vec<&str>, Vec<&str>); 3] = Default::default();
    for (truth, predicted) in pairs {
        columns[0].0.push(&truth.location);
        columns[0].1.push(&predicted.location);
        columns[1].0.push(&truth.country);
        columns[1].1.push(&predicted.country);
        columns[2].0.push(&truth.continent);
        columns[2].1.push(&predicted.continent);
    }
    let [location, country, continent] = columns;

    Ok(ClassificationReport {
        evaluated: pairs.len(),
        skipped,
        location: field_metrics(&location.0, &location.1)?,
        country: field_metrics(&country.0, &country.1)?,
        continent: field_metrics(&continent.0, &continent.1)?,
    })
}

/// Score every same-named pair of `location, country, continent` files
pub fn evaluate_classification(truth_dir: &Path, prediction_dir: &Path) -> Result<ClassificationReport, MetricsError> {
    let mut pairs = Vec::new();
    let mut skipped = 0;

    for pair in paired_files(truth_dir, prediction_dir)? {
        let parsed = first_line(&pair.truth)
            .and_then(|line| LocationTriple::parse(&line))
            .and_then(|truth| {
                let predicted = LocationTriple::parse(&first_line(&pair.prediction)?)?;
                Ok((truth, predicted))
            });

        match parsed {
            Ok((truth, predicted)) => {
                for (field, value) in [
                    ("location", &predicted.location),
                    ("country", &predicted.country),
                    ("continent", &predicted.continent),
                ] {
                    if value == NONE_LABEL {
                        warn!("{}: no {} predicted", pair.name, field);
                    }
                }
                pairs.push((truth, predicted));
            }
            Err(e) => {
                warn!("Skipping {}: {}", pair.name, e);
                skipped += 1;
            }
        }
    }

    let report = classify(&pairs, skipped)?;
    info!("Evaluated {} classification pairs", report.evaluated);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_splits_from_right() {
        let triple = LocationTriple::parse("Shibuya, Tokyo, Japan, Asia").unwrap();
        assert_eq!(triple, LocationTriple::new("Shibuya, Tokyo", "Japan", "Asia"));
        assert_eq!(triple.to_string(), "Shibuya, Tokyo, Japan, Asia");
    }

    #[test]
    fn test_parse_rejects_two_fields() {
        assert!(matches!(
            LocationTriple::parse("Japan, Asia"),
            Err(MetricsError::InvalidFormat(_))
        ));
        assert!(LocationTriple::parse("Lima,Peru,South America").is_err());
    }

    #[test]
    fn test_perfect_predictions() {
        let labels = ["a", "b", "b", "c"];
        let metrics = field_metrics(&labels, &labels).unwrap();
        assert_eq!(metrics, FieldMetrics { accuracy: 1.0, recall: 1.0, f1_score: 1.0 });
    }

    #[test]
    fn test_macro_averages() {
        // Per label: a r=0.5 p=0.5; b r=1 p=0.5; c r=0 p=0
        let truth = ["a", "a", "b", "c"];
        let predicted = ["a", "b", "b", "a"];
        let metrics = field_metrics(&truth, &predicted).unwrap();
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert_eq!(metrics.f1_score, 0.389);
    }

    #[test]
    fn test_predicted_only_labels_count_as_zero() {
        // "none" has no support: recall 0, precision 0
        let truth = ["x", "y"];
        let predicted = ["x", "none"];
        let metrics = field_metrics(&truth, &predicted).unwrap();
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.recall, 0.333);
        assert_eq!(metrics.f1_score, 0.333);
    }

    #[test]
    fn test_empty_labels() {
        let empty: [&str; 0] = [];
        assert!(matches!(field_metrics(&empty, &empty), Err(MetricsError::Empty(_))));
    }

    #[test]
    fn test_evaluate_directories() {
        let truth = tempfile::tempdir().unwrap();
        let pred = tempfile::tempdir().unwrap();
        fs::write(truth.path().join("1.txt"), "Helsinki, Finland, Europe").unwrap();
        fs::write(pred.path().join("1.txt"), "Helsinki, Finland, Europe").unwrap();
        fs::write(truth.path().join("2.txt"), "Cusco, Peru, South America").unwrap();
        fs::write(pred.path().join("2.txt"), "none, Chile, South America").unwrap();
        fs::write(truth.path().join("3.txt"), "Osaka, Japan, Asia").unwrap();
        fs::write(pred.path().join("3.txt"), "no idea").unwrap();

        let report = evaluate_classification(truth.path(), pred.path()).unwrap();
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.continent.accuracy, 1.0);
        assert_eq!(report.country.accuracy, 0.5);
        assert_eq!(report.location.accuracy, 0.5);
    }
}
