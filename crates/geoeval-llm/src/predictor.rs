//! Coordinate prediction from location descriptions
//!
//! The completion service is asked for a bare `Latitude, Longitude` answer.
//! Answers are validated by parsing them as a [`Coordinate`]; anything else
//! is retried up to a fixed number of attempts, after which the sentinel
//! `0.0, 0.0` is used so a batch never stalls on one input.

use crate::LlmError;
use geoeval_domain::{CompletionProvider, Coordinate};
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default number of completion attempts per description
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const SYSTEM_PROMPT: &str = "You are a geolocation expert.";

/// Result of predicting one description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// The validated coordinate, or the sentinel
    pub coordinate: Coordinate,

    /// Completion calls made
    pub attempts: u32,

    /// Whether the sentinel was substituted
    pub fallback: bool,
}

/// Summary of a batch run over a directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Descriptions sent to the completion service
    pub predicted: usize,

    /// Ids skipped because an output file already existed
    pub skipped_existing: usize,

    /// Outputs that hold the sentinel
    pub fallbacks: usize,
}

/// Asks a completion service for coordinates and validates the answers
pub struct CoordinatePredictor<P> {
    provider: P,
    max_attempts: u32,
}

impl<P> CoordinatePredictor<P>
where
    P: CompletionProvider,
    P::Error: Display,
{
    /// Create a predictor with the default attempt limit
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the attempt limit (at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Build the prompt sent for `description`
    pub fn prompt(description: &str) -> String {
        format!(
            "Based on the following description of a location, predict the most likely \
             latitude and longitude in decimal degrees, with at least 5 decimal places. \
             If the details are ambiguous, use contextual clues to estimate a plausible \
             location. Always respond strictly in the format:\n\
             'Latitude, Longitude'. No additional text or explanation.\n\n\
             Location description:\n{}",
            description
        )
    }

    /// Predict a coordinate for `description`
    ///
    /// Never fails: a provider error or too many unparseable answers yields
    /// the sentinel with `fallback` set.
    pub fn predict(&self, description: &str) -> Prediction {
        let prompt = Self::prompt(description);

        for attempt in 1..=self.max_attempts {
            let answer = match self.provider.generate_with_system(SYSTEM_PROMPT, &prompt) {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Completion failed, using sentinel: {}", e);
                    return Self::fallback(attempt);
                }
            };

            match strip_quotes(&answer).parse::<Coordinate>() {
                Ok(coordinate) => {
                    debug!("Attempt {} answered {}", attempt, coordinate);
                    return Prediction {
                        coordinate,
                        attempts: attempt,
                        fallback: false,
                    };
                }
                Err(e) => debug!("Attempt {} answered {:?}: {}", attempt, answer, e),
            }
        }

        warn!(
            "No valid coordinate after {} attempts, using sentinel",
            self.max_attempts
        );
        Self::fallback(self.max_attempts)
    }

    fn fallback(attempts: u32) -> Prediction {
        Prediction {
            coordinate: Coordinate::SENTINEL,
            attempts,
            fallback: true,
        }
    }

    /// Predict every `<id>.txt` in `input_dir`, writing `<id>.txt` results to
    /// `output_dir`
    ///
    /// Ids with an existing output file are skipped, so an interrupted run can
    /// be resumed. Empty descriptions get the sentinel without a service call.
    pub fn predict_directory(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport, LlmError> {
        fs::create_dir_all(output_dir)?;
        let mut report = BatchReport::default();

        for input in txt_files(input_dir)? {
            let Some(name) = input.file_name() else { continue };
            let output = output_dir.join(name);
            if output.exists() {
                debug!("{} already processed, skipping", output.display());
                report.skipped_existing += 1;
                continue;
            }

            let description = fs::read_to_string(&input)?;
            let description = description.trim();
            let coordinate = if description.is_empty() {
                warn!("{} is empty, writing sentinel", input.display());
                report.fallbacks += 1;
                Coordinate::SENTINEL
            } else {
                let prediction = self.predict(description);
                report.predicted += 1;
                if prediction.fallback {
                    report.fallbacks += 1;
                }
                prediction.coordinate
            };

            info!("Predicted for {}: {}", name.to_string_lossy(), coordinate);
            fs::write(&output, coordinate.to_string())?;
        }

        Ok(report)
    }
}

fn strip_quotes(answer: &str) -> &str {
    answer.trim().trim_matches(|c| c == '\'' || c == '"' || c == '`').trim()
}

/// `.txt` files directly inside `dir`, sorted by name
pub(crate) fn txt_files(dir: &Path) -> Result<Vec<PathBuf>, LlmError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    #[test]
    fn test_valid_first_answer() {
        let provider = MockProvider::new("-33.85678, 151.21530");
        let predictor = CoordinatePredictor::new(provider.clone());

        let prediction = predictor.predict("Opera house by a harbour");
        assert_eq!(prediction.coordinate, Coordinate::new(-33.85678, 151.2153).unwrap());
        assert_eq!(prediction.attempts, 1);
        assert!(!prediction.fallback);
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_retries_until_valid() {
        let provider = MockProvider::new("unused");
        provider.queue_response("Somewhere in France");
        provider.queue_response("48.85, 2.29, 35");
        provider.queue_response("'48.8584, 2.2945'");
        let predictor = CoordinatePredictor::new(provider.clone());

        let prediction = predictor.predict("Iron lattice tower");
        assert_eq!(prediction.coordinate.to_string(), "48.8584, 2.2945");
        assert_eq!(prediction.attempts, 3);
        assert!(!prediction.fallback);
    }

    #[test]
    fn test_exhausted_attempts_use_sentinel() {
        let provider = MockProvider::new("I cannot tell");
        let predictor = CoordinatePredictor::new(provider.clone()).with_max_attempts(4);

        let prediction = predictor.predict("A blurry field");
        assert!(prediction.coordinate.is_sentinel());
        assert!(prediction.fallback);
        assert_eq!(provider.call_count(), 4);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let provider = MockProvider::new("nope");
        provider.queue_response("123.0, 45.0");
        let predictor = CoordinatePredictor::new(provider.clone()).with_max_attempts(2);

        let prediction = predictor.predict("x");
        assert!(prediction.fallback);
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_provider_error_uses_sentinel_immediately() {
        let provider = MockProvider::new("1.0, 2.0");
        provider.queue_error();
        let predictor = CoordinatePredictor::new(provider.clone());

        let prediction = predictor.predict("x");
        assert!(prediction.fallback);
        assert_eq!(prediction.attempts, 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_predict_directory() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.txt"), "Snowy peaks over a lake").unwrap();
        fs::write(input.path().join("b.txt"), "   ").unwrap();
        fs::write(input.path().join("c.txt"), "Already done").unwrap();
        fs::write(input.path().join("notes.md"), "ignored").unwrap();
        fs::write(output.path().join("c.txt"), "1.0, 1.0").unwrap();

        let provider = MockProvider::new("46.5, 8.25");
        let predictor = CoordinatePredictor::new(provider.clone());
        let report = predictor.predict_directory(input.path(), output.path()).unwrap();

        assert_eq!(
            report,
            BatchReport {
                predicted: 1,
                skipped_existing: 1,
                fallbacks: 1
            }
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(fs::read_to_string(output.path().join("a.txt")).unwrap(), "46.5, 8.25");
        assert_eq!(fs::read_to_string(output.path().join("b.txt")).unwrap(), "0.0, 0.0");
        assert_eq!(fs::read_to_string(output.path().join("c.txt")).unwrap(), "1.0, 1.0");
        assert!(!output.path().join("notes.md").exists());
    }
}
