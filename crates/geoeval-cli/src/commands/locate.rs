//! Locate command implementation.

use crate::cli::PredictArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use geoeval_geocode::GoogleGeocoder;
use geoeval_llm::{AddressResolver, OpenAiProvider};

/// Address answers are short place names.
const ADDRESS_MAX_TOKENS: u32 = 50;

/// Execute the locate command.
pub async fn execute_locate(args: PredictArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let services = &config.services;
    let provider = OpenAiProvider::from_env(
        services.completion_endpoint.clone(),
        services.completion_model.clone(),
        &services.completion_key_env,
    )?
    .with_max_tokens(ADDRESS_MAX_TOKENS)
    .with_temperature(0.7);
    let geocoder = GoogleGeocoder::from_env(services.geocode_endpoint.clone(), &services.geocode_key_env)?;
    let resolver = AddressResolver::new(provider, geocoder);

    let report = tokio::task::spawn_blocking(move || {
        resolver.resolve_directory(&args.input_dir, &args.output_dir)
    })
    .await??;

    println!("{}", formatter.format_batch(&report)?);
    Ok(())
}
