//! Geocode command implementation.

use crate::cli::GeocodeArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoeval_domain::{Coordinate, GeocodeOutcome};
use geoeval_extractor::OutputTable;
use geoeval_geocode::{resolve_or_sentinel, GeocodeError, GoogleGeocoder};
use geoeval_metrics::files::txt_files;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Execute the geocode command.
///
/// Lookups that find nothing print the `0.0, 0.0` sentinel; only a missing
/// API key is fatal.
pub async fn execute_geocode(args: GeocodeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let geocoder = GoogleGeocoder::from_env(
        config.services.geocode_endpoint.clone(),
        &config.services.geocode_key_env,
    )?;

    if let Some(dir) = args.pano_dir {
        let output = args
            .output
            .ok_or_else(|| CliError::InvalidInput("--pano-dir requires --output".to_string()))?;
        let delay = Duration::from_millis(args.delay_ms);
        return execute_pano_dir(&geocoder, &dir, &output, delay, formatter).await;
    }

    let (query, coordinate) = match (args.pano, args.address) {
        (Some(pano), _) => {
            let coordinate = match geocoder.lookup_pano(&pano).await {
                Ok(GeocodeOutcome::Found(coordinate)) => coordinate,
                Ok(GeocodeOutcome::NotFound) => {
                    warn!("No panorama '{}', using sentinel", pano);
                    Coordinate::SENTINEL
                }
                Err(e) => {
                    warn!("Panorama lookup '{}' failed, using sentinel: {}", pano, e);
                    Coordinate::SENTINEL
                }
            };
            (pano, coordinate)
        }
        (None, Some(address)) => {
            let query = address.clone();
            let coordinate =
                tokio::task::spawn_blocking(move || resolve_or_sentinel(&geocoder, &address)).await?;
            (query, coordinate)
        }
        (None, None) => {
            return Err(CliError::InvalidInput(
                "Must specify an address, --pano or --pano-dir".to_string(),
            ))
        }
    };

    println!("{}", formatter.format_coordinate(&query, coordinate)?);
    Ok(())
}

/// Look up every panorama named by a `.txt` file in `dir` and write the hits to `output`.
async fn execute_pano_dir(
    geocoder: &GoogleGeocoder,
    dir: &Path,
    output: &Path,
    delay: Duration,
    formatter: &Formatter,
) -> Result<()> {
    let ids = pano_ids(dir)?;
    if ids.is_empty() {
        warn!("No .txt files in {}", dir.display());
    }

    let mut lookups = Vec::with_capacity(ids.len());
    for (i, id) in ids.into_iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = geocoder.lookup_pano(&id).await;
        lookups.push((id, result));
    }

    let (table, missing) = pano_table(lookups);
    table.write_path(output)?;
    info!(
        "Located {} panorama(s), {} without a location, wrote {}",
        table.len(),
        missing,
        output.display()
    );

    println!("{}", formatter.format_table(&table)?);
    Ok(())
}

/// Panorama ids: the stems of the `.txt` files in `dir`, sorted.
pub fn pano_ids(dir: &Path) -> Result<Vec<String>> {
    Ok(txt_files(dir)?
        .iter()
        .filter_map(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .collect())
}

/// Build the `panoID, lat, lng` table from lookup results.
///
/// Panoramas without a location are logged and left out; the second value
/// counts them.
pub fn pano_table(lookups: Vec<(String, std::result::Result<GeocodeOutcome, GeocodeError>)>) -> (OutputTable, usize) {
    let mut table = OutputTable::new(vec!["panoID".into(), "lat".into(), "lng".into()]);
    let mut missing = 0;

    for (id, result) in lookups {
        match result {
            Ok(GeocodeOutcome::Found(coordinate)) => {
                table
                    .rows
                    .push(vec![id, coordinate.lat.to_string(), coordinate.lng.to_string()]);
            }
            Ok(GeocodeOutcome::NotFound) => {
                warn!("No location for panorama {}", id);
                missing += 1;
            }
            Err(e) => {
                warn!("Panorama lookup {} failed: {}", id, e);
                missing += 1;
            }
        }
    }

    (table, missing)
}
