//! Collect command implementation.

use crate::cli::{CollectArgs, Preset};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoeval_extractor::{ExtractorConfig, ProgressObserver, StreamingExtractor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the extractor configuration from a TOML file or from flags.
pub fn build_config(args: CollectArgs) -> Result<ExtractorConfig> {
    if let Some(path) = args.config_file {
        return Ok(ExtractorConfig::from_file(path)?);
    }

    let (Some(input), Some(output)) = (args.input, args.output) else {
        return Err(CliError::InvalidInput(
            "Must specify either --config-file or both --input and --output".to_string(),
        ));
    };

    let mut config = match args.preset {
        Preset::Panoids => ExtractorConfig::panoids(input, output, args.keys),
        Preset::Coords => ExtractorConfig::panoids_with_coords(input, output, args.keys),
    };
    if let Some(quota) = args.quota {
        config.quota = quota;
    }
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

/// Execute the collect command.
///
/// The scan runs on the blocking pool; Ctrl-C sets the observer's cancel
/// flag so the partial table is still written.
pub async fn execute_collect(args: CollectArgs, formatter: &Formatter) -> Result<()> {
    let config = build_config(args)?;
    let extractor = StreamingExtractor::from_config(&config)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let signal = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing current record");
                cancel.store(true, Ordering::SeqCst);
            }
        })
    };

    info!(
        "Collecting up to {} rows for {} key(s) from {}",
        config.quota,
        config.keys_of_interest.len(),
        config.input_path.display()
    );
    let output_path = config.output_path.clone();
    let scan = tokio::task::spawn_blocking(move || {
        let mut observer = ProgressObserver::new(config.progress_interval).with_cancel_flag(cancel);
        extractor.run(&config, &mut observer)
    })
    .await;
    signal.abort();
    let outcome = scan??;

    println!("{}", formatter.format_scan(&outcome.stats)?);
    println!(
        "{}",
        formatter.success(&format!(
            "Wrote {} row(s) to {}",
            outcome.table.len(),
            output_path.display()
        ))
    );
    Ok(())
}
