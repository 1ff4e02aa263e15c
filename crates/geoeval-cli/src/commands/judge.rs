//! Judge command implementation.

use crate::cli::JudgeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use geoeval_llm::{OpenAiProvider, RubricJudge};

/// Execute the judge command.
pub async fn execute_judge(args: JudgeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let services = &config.services;
    let provider = OpenAiProvider::from_env(
        services.completion_endpoint.clone(),
        services.completion_model.clone(),
        &services.completion_key_env,
    )?
    .with_temperature(0.0);
    let judge = RubricJudge::new(provider).with_max_attempts(config.retry.max_attempts);

    let report = tokio::task::spawn_blocking(move || {
        judge.judge_directory(&args.ground_truth_dir, &args.eval_dir, &args.output_dir)
    })
    .await??;

    println!("{}", formatter.format_judge(&report)?);
    Ok(())
}
