//! Rubric judging of reasoning texts against ground-truth descriptions

use crate::predictor::txt_files;
use crate::LlmError;
use geoeval_domain::CompletionProvider;
use serde::Serialize;
use std::fmt::{self, Display};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default number of completion attempts per dimension
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// One scored aspect of a reasoning text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RubricDimension {
    /// Completeness of clue extraction (CE)
    ClueCompleteness,
    /// Accuracy of clue extraction (AE)
    ClueAccuracy,
    /// Correctness of the relation between inference and clues (AC)
    InferenceRelation,
    /// Reasonableness of the inferential logic (LC)
    InferenceLogic,
}

impl RubricDimension {
    /// All dimensions, in output column order
    pub const ALL: [RubricDimension; 4] = [
        RubricDimension::ClueCompleteness,
        RubricDimension::ClueAccuracy,
        RubricDimension::InferenceRelation,
        RubricDimension::InferenceLogic,
    ];

    /// Short column code
    pub fn code(&self) -> &'static str {
        match self {
            RubricDimension::ClueCompleteness => "CE",
            RubricDimension::ClueAccuracy => "AE",
            RubricDimension::InferenceRelation => "AC",
            RubricDimension::InferenceLogic => "LC",
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            RubricDimension::ClueCompleteness => {
                "Evaluate the Completeness of Clue Extraction (CE): does the evaluation text \
                 cover every clue relevant to locating the image that the ground truth mentions \
                 (vegetation, terrain and soil, architecture, signage, street furniture)?\n\
                 5: every clue in the ground truth is covered with no missing details.\n\
                 2.5: some clues are extracted, but several are missing.\n\
                 1: most clues are missing or only vaguely described."
            }
            RubricDimension::ClueAccuracy => {
                "Evaluate the Accuracy of Clue Extraction (AE): are the extracted clues correct \
                 and relevant, without distracting or invented details?\n\
                 5: clues match the ground truth and support the correct inference.\n\
                 2.5: mostly correct clues with minor inaccuracies.\n\
                 1: clues are largely wrong and contradict the ground truth."
            }
            RubricDimension::InferenceRelation => {
                "Evaluate the Correctness of the Relationship Between Inference and Clues (AC): \
                 are conclusions drawn from the extracted clues rather than from irrelevant ones?\n\
                 5: conclusions follow from the clues, consistent with the ground truth.\n\
                 2.5: partially correct, with vague conclusions or several candidate locations.\n\
                 1: no logical connection between clues and conclusions."
            }
            RubricDimension::InferenceLogic => {
                "Evaluate the Reasonableness of the Inferential Logic of Clues (LC): is the \
                 reasoning chain coherent and consistent with common sense?\n\
                 5: coherent reasoning without contradictions.\n\
                 2.5: minor contradictions but generally coherent.\n\
                 1: severe contradictions or unreasonable conclusions."
            }
        }
    }
}

/// Score for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Score {
    /// A value in `[1, 5]`
    Scored(f64),
    /// No valid score after all attempts
    Unscored,
}

impl Score {
    /// Parse a bare numeric answer in `[1, 5]`
    pub fn parse(answer: &str) -> Option<f64> {
        let value: f64 = answer.trim().trim_end_matches('.').parse().ok()?;
        (value.is_finite() && (1.0..=5.0).contains(&value)).then_some(value)
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Scored(value) => write!(f, "{}", value),
            Score::Unscored => write!(f, "unscored"),
        }
    }
}

/// Scores for all four dimensions of one text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricScores {
    /// Scores in [`RubricDimension::ALL`] order
    pub scores: [Score; 4],
}

impl RubricScores {
    /// Whether every dimension got a score
    pub fn is_complete(&self) -> bool {
        self.scores.iter().all(|s| matches!(s, Score::Scored(_)))
    }

    /// Comma-separated line, e.g. `5,2.5,4,3`
    pub fn to_line(&self) -> String {
        self.scores
            .iter()
            .map(Score::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Summary of judging a directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JudgeReport {
    /// Texts judged and written
    pub judged: usize,

    /// Evaluation files with no ground-truth counterpart
    pub unmatched: usize,

    /// Judged texts with at least one unscored dimension
    pub incomplete: usize,
}

/// Scores reasoning texts on a 1-5 rubric using a completion service
pub struct RubricJudge<P> {
    provider: P,
    max_attempts: u32,
}

impl<P> RubricJudge<P>
where
    P: CompletionProvider,
    P::Error: Display,
{
    /// Create a judge with the default attempt limit
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the attempt limit per dimension (at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Build the prompt for one dimension
    pub fn prompt(dimension: RubricDimension, ground_truth: &str, evaluation: &str) -> String {
        format!(
            "Ground Truth:\n{}\n\nEvaluation Text:\n{}\n\n{}\n\
             Only provide a numerical score between 1 and 5.",
            ground_truth,
            evaluation,
            dimension.instructions()
        )
    }

    /// Score one dimension
    ///
    /// Provider errors and invalid answers both use up an attempt.
    pub fn score(&self, dimension: RubricDimension, ground_truth: &str, evaluation: &str) -> Score {
        let prompt = Self::prompt(dimension, ground_truth, evaluation);

        for attempt in 1..=self.max_attempts {
            match self.provider.generate(&prompt) {
                Ok(answer) => match Score::parse(&answer) {
                    Some(value) => return Score::Scored(value),
                    None => debug!("{} attempt {} answered {:?}", dimension.code(), attempt, answer),
                },
                Err(e) => warn!("{} attempt {} failed: {}", dimension.code(), attempt, e),
            }
        }

        warn!(
            "No valid {} score after {} attempts",
            dimension.code(),
            self.max_attempts
        );
        Score::Unscored
    }

    /// Score all four dimensions
    pub fn judge(&self, ground_truth: &str, evaluation: &str) -> RubricScores {
        RubricScores {
            scores: RubricDimension::ALL.map(|dimension| self.score(dimension, ground_truth, evaluation)),
        }
    }

    /// Judge every `.txt` in `eval_dir` that has a same-named ground truth in
    /// `ground_truth_dir`, writing one score line per file to `output_dir`
    pub fn judge_directory(
        &self,
        ground_truth_dir: &Path,
        eval_dir: &Path,
        output_dir: &Path,
    ) -> Result<JudgeReport, LlmError> {
        fs::create_dir_all(output_dir)?;
        let mut report = JudgeReport::default();

        for eval_path in txt_files(eval_dir)? {
            let Some(name) = eval_path.file_name() else { continue };
            let gt_path = ground_truth_dir.join(name);
            if !gt_path.is_file() {
                debug!("No ground truth for {}", name.to_string_lossy());
                report.unmatched += 1;
                continue;
            }

            let ground_truth = fs::read_to_string(&gt_path)?;
            let evaluation = fs::read_to_string(&eval_path)?;
            let scores = self.judge(&ground_truth, &evaluation);
            if !scores.is_complete() {
                report.incomplete += 1;
            }

            info!("Scored {}: {}", name.to_string_lossy(), scores.to_line());
            fs::write(output_dir.join(name), scores.to_line())?;
            report.judged += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    #[test]
    fn test_score_parse() {
        assert_eq!(Score::parse("5"), Some(5.0));
        assert_eq!(Score::parse(" 2.5\n"), Some(2.5));
        assert_eq!(Score::parse("4."), Some(4.0));
        assert_eq!(Score::parse("0"), None);
        assert_eq!(Score::parse("6"), None);
        assert_eq!(Score::parse("NaN"), None);
        assert_eq!(Score::parse("Score: 4"), None);
    }

    #[test]
    fn test_score_line_format() {
        let scores = RubricScores {
            scores: [Score::Scored(5.0), Score::Scored(2.5), Score::Unscored, Score::Scored(1.0)],
        };
        assert_eq!(scores.to_line(), "5,2.5,unscored,1");
        assert!(!scores.is_complete());
    }

    #[test]
    fn test_judge_uses_dimension_prompts() {
        let mut provider = MockProvider::new("3");
        provider.add_response("(CE)", "5");
        provider.add_response("(LC)", "2.5");
        let judge = RubricJudge::new(provider.clone());

        let scores = judge.judge("Red soil, tin roofs", "I see red soil");
        assert_eq!(
            scores.scores,
            [Score::Scored(5.0), Score::Scored(3.0), Score::Scored(3.0), Score::Scored(2.5)]
        );
        assert_eq!(provider.call_count(), 4);
    }

    #[test]
    fn test_retry_then_unscored() {
        let provider = MockProvider::new("I would say it is good");
        provider.queue_error();
        provider.queue_response("4");
        let judge = RubricJudge::new(provider.clone()).with_max_attempts(2);

        assert_eq!(
            judge.score(RubricDimension::ClueCompleteness, "gt", "eval"),
            Score::Scored(4.0)
        );
        assert_eq!(
            judge.score(RubricDimension::ClueAccuracy, "gt", "eval"),
            Score::Unscored
        );
        assert_eq!(provider.call_count(), 4);
    }

    #[test]
    fn test_judge_directory() {
        let gt = tempfile::tempdir().unwrap();
        let eval = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(gt.path().join("p1.txt"), "ground truth").unwrap();
        fs::write(eval.path().join("p1.txt"), "reasoning").unwrap();
        fs::write(eval.path().join("p2.txt"), "orphan").unwrap();

        let judge = RubricJudge::new(MockProvider::new("4"));
        let report = judge
            .judge_directory(gt.path(), eval.path(), out.path())
            .unwrap();

        assert_eq!(
            report,
            JudgeReport {
                judged: 1,
                unmatched: 1,
                incomplete: 0
            }
        );
        assert_eq!(fs::read_to_string(out.path().join("p1.txt")).unwrap(), "4,4,4,4");
        assert!(!out.path().join("p2.txt").exists());
    }
}
