//! Similarity command implementation.

use crate::cli::SimilarityArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use geoeval_domain::EmbeddingProvider;
use geoeval_llm::OpenAiProvider;
use geoeval_metrics::{evaluate_similarity, SimilarityReport};
use std::fmt::Display;

/// Execute the similarity command.
pub async fn execute_similarity(args: SimilarityArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let services = &config.services;
    let embedder = OpenAiProvider::from_env(
        services.completion_endpoint.clone(),
        services.completion_model.clone(),
        &services.completion_key_env,
    )?
    .with_embedding_model(services.embedding_model.clone());

    let report = tokio::task::spawn_blocking(move || similarity(&embedder, &args)).await??;

    println!("{}", formatter.format_similarity(&report)?);
    Ok(())
}

/// Score the directories in `args` with `embedder`.
pub fn similarity<E>(embedder: &E, args: &SimilarityArgs) -> Result<SimilarityReport>
where
    E: EmbeddingProvider,
    E::Error: Display,
{
    Ok(evaluate_similarity(embedder, &args.ground_truth_dir, &args.eval_dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use geoeval_llm::MockEmbedder;
    use std::fs;

    #[test]
    fn test_identical_descriptions_score_one() {
        let gt = tempfile::tempdir().unwrap();
        let pred = tempfile::tempdir().unwrap();
        let text = "A narrow cobbled street lined with pastel houses and a tram line.";
        fs::write(gt.path().join("p1.txt"), text).unwrap();
        fs::write(pred.path().join("p1.txt"), text).unwrap();
        fs::write(gt.path().join("p2.txt"), "Desert highway under a clear sky.").unwrap();
        fs::write(pred.path().join("p2.txt"), "desert highway, clear sky").unwrap();

        let embedder = MockEmbedder::default();
        let args = SimilarityArgs {
            ground_truth_dir: gt.path().to_path_buf(),
            eval_dir: pred.path().to_path_buf(),
        };
        let report = similarity(&embedder, &args).unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped, 0);
        assert!(report.mean > 0.5 && report.mean <= 1.0 + 1e-6);
        assert_eq!(embedder.call_count(), 4);
    }

    #[test]
    fn test_no_pairs_is_an_error() {
        let gt = tempfile::tempdir().unwrap();
        let pred = tempfile::tempdir().unwrap();
        fs::write(gt.path().join("p1.txt"), "only ground truth").unwrap();

        let args = SimilarityArgs {
            ground_truth_dir: gt.path().to_path_buf(),
            eval_dir: pred.path().to_path_buf(),
        };
        let result = similarity(&MockEmbedder::default(), &args);
        assert!(matches!(result, Err(CliError::Metrics(_))));
    }
}
