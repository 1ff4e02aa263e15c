//! Offline scoring commands: distance, classify, describe, means, count.

use crate::cli::{ClassifyArgs, DescribeArgs, DirArgs, DistanceArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoeval_metrics::{
    count_txt_files, describe_csv, evaluate_classification, evaluate_distances, score_means,
    DistanceConfig,
};

/// Execute the distance command.
pub async fn execute_distance(args: DistanceArgs, formatter: &Formatter) -> Result<()> {
    let config = if args.thresholds.is_empty() {
        DistanceConfig::default()
    } else {
        DistanceConfig {
            thresholds_km: args.thresholds,
        }
    };
    config.validate().map_err(CliError::InvalidInput)?;

    let report = evaluate_distances(&args.ground_truth_dir, &args.eval_dir, &config)?;
    println!("{}", formatter.format_distance(&report)?);
    Ok(())
}

/// Execute the classify command.
pub async fn execute_classify(args: ClassifyArgs, formatter: &Formatter) -> Result<()> {
    let report = evaluate_classification(&args.ground_truth_dir, &args.eval_dir)?;
    println!("{}", formatter.format_classification(&report)?);
    Ok(())
}

/// Execute the describe command.
pub async fn execute_describe(args: DescribeArgs, formatter: &Formatter) -> Result<()> {
    let report = describe_csv(&args.input, &args.output_dir)?;
    println!("{}", formatter.format_describe(&report)?);
    Ok(())
}

/// Execute the means command.
pub async fn execute_means(args: DirArgs, formatter: &Formatter) -> Result<()> {
    let means = score_means(&args.dir)?;
    println!("{}", formatter.format_means(&means)?);
    Ok(())
}

/// Execute the count command.
pub async fn execute_count(args: DirArgs, formatter: &Formatter) -> Result<()> {
    let count = count_txt_files(&args.dir)?;
    println!("{}", formatter.format_count(&args.dir.display().to_string(), count)?);
    Ok(())
}
