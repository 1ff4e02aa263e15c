//! Predict command implementation.

use crate::cli::PredictArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use geoeval_llm::{CoordinatePredictor, OpenAiProvider};

/// Execute the predict command.
pub async fn execute_predict(args: PredictArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let services = &config.services;
    let provider = OpenAiProvider::from_env(
        services.completion_endpoint.clone(),
        services.completion_model.clone(),
        &services.completion_key_env,
    )?;
    let predictor = CoordinatePredictor::new(provider).with_max_attempts(config.retry.max_attempts);

    let report = tokio::task::spawn_blocking(move || {
        predictor.predict_directory(&args.input_dir, &args.output_dir)
    })
    .await??;

    println!("{}", formatter.format_batch(&report)?);
    Ok(())
}
