//! Description to address to coordinate
//!
//! A two-stage alternative to [`CoordinatePredictor`](crate::CoordinatePredictor):
//! the completion service names a place for the description, and a geocoder
//! turns that name into a coordinate. Any stage that comes back empty yields
//! the sentinel.

use crate::predictor::{txt_files, BatchReport};
use crate::LlmError;
use geoeval_domain::{CompletionProvider, Coordinate, Geocoder};
use geoeval_geocode::resolve_or_sentinel;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a helpful assistant for extracting locations from text.";

/// Outcome of resolving one description
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Address named by the completion service, if any
    pub address: Option<String>,

    /// Geocoded coordinate, or the sentinel
    pub coordinate: Coordinate,
}

impl Resolution {
    /// Whether the sentinel was substituted
    pub fn is_fallback(&self) -> bool {
        self.coordinate.is_sentinel()
    }
}

/// Resolves descriptions through an address lookup
pub struct AddressResolver<P, G> {
    provider: P,
    geocoder: G,
}

impl<P, G> AddressResolver<P, G>
where
    P: CompletionProvider,
    P::Error: Display,
    G: Geocoder,
    G::Error: Display,
{
    /// Create a resolver from a completion service and a geocoder
    pub fn new(provider: P, geocoder: G) -> Self {
        Self { provider, geocoder }
    }

    /// Build the prompt sent for `description`
    pub fn prompt(description: &str) -> String {
        format!(
            "Analyze the following text and predict the most likely location based on the \
             description. The output should be a specific location such as a city, country, \
             or region. If the description is vague or unclear, make a reasonable assumption \
             based on the available details. Always provide a plausible address.\n\n\
             Description:\n{}\n\n\
             Output the predicted location (e.g., 'Kampala, Uganda' or 'East Africa'):",
            description
        )
    }

    /// Ask for an address, then geocode it
    pub fn resolve(&self, description: &str) -> Resolution {
        let address = match self
            .provider
            .generate_with_system(SYSTEM_PROMPT, &Self::prompt(description))
        {
            Ok(answer) => strip_quotes(&answer).to_string(),
            Err(e) => {
                warn!("Address extraction failed, using sentinel: {}", e);
                return Resolution {
                    address: None,
                    coordinate: Coordinate::SENTINEL,
                };
            }
        };

        if address.is_empty() {
            warn!("Completion named no address, using sentinel");
            return Resolution {
                address: None,
                coordinate: Coordinate::SENTINEL,
            };
        }

        debug!("Extracted address {:?}", address);
        let coordinate = resolve_or_sentinel(&self.geocoder, &address);
        Resolution {
            address: Some(address),
            coordinate,
        }
    }

    /// Resolve every `<id>.txt` in `input_dir`, writing `lat, lng` to
    /// `output_dir/<id>.txt`
    ///
    /// Ids with an existing output file are skipped.
    pub fn resolve_directory(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport, LlmError> {
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
                Coordinate::SENTINEL
            } else {
                report.predicted += 1;
                self.resolve(description).coordinate
            };
            if coordinate.is_sentinel() {
                report.fallbacks += 1;
            }

            info!("Resolved {}: {}", name.to_string_lossy(), coordinate);
            fs::write(&output, coordinate.to_string())?;
        }

        Ok(report)
    }
}

fn strip_quotes(answer: &str) -> &str {
    answer.trim().trim_matches(|c| c == '\'' || c == '"').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use geoeval_geocode::MockGeocoder;

    fn kampala() -> Coordinate {
        Coordinate::new(0.3476, 32.5825).unwrap()
    }

    fn geocoder() -> MockGeocoder {
        let mut geocoder = MockGeocoder::new();
        geocoder.add_location("Kampala, Uganda", kampala());
        geocoder.add_failure("Atlantis");
        geocoder
    }

    #[test]
    fn test_resolve_geocodes_the_named_address() {
        let provider = MockProvider::new("'Kampala, Uganda'");
        let resolver = AddressResolver::new(provider.clone(), geocoder());

        let resolution = resolver.resolve("Red soil, boda-bodas and a lake shore");
        assert_eq!(resolution.address.as_deref(), Some("Kampala, Uganda"));
        assert_eq!(resolution.coordinate, kampala());
        assert!(!resolution.is_fallback());
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_unknown_or_failing_address_uses_sentinel() {
        let resolver = AddressResolver::new(MockProvider::new("Narnia"), geocoder());
        assert!(resolver.resolve("x").is_fallback());

        let resolver = AddressResolver::new(MockProvider::new("Atlantis"), geocoder());
        let resolution = resolver.resolve("x");
        assert_eq!(resolution.address.as_deref(), Some("Atlantis"));
        assert!(resolution.is_fallback());
    }

    #[test]
    fn test_completion_error_skips_geocoding() {
        let provider = MockProvider::new("Kampala, Uganda");
        provider.queue_error();
        let geocoder = geocoder();
        let resolver = AddressResolver::new(provider, geocoder.clone());

        let resolution = resolver.resolve("x");
        assert!(resolution.address.is_none());
        assert!(resolution.is_fallback());
        assert_eq!(geocoder.call_count(), 0);
    }

    #[test]
    fn test_resolve_directory() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.txt"), "Lake Victoria shoreline").unwrap();
        fs::write(input.path().join("b.txt"), "").unwrap();
        fs::write(input.path().join("c.txt"), "Already done").unwrap();
        fs::write(output.path().join("c.txt"), "1.0, 1.0").unwrap();

        let provider = MockProvider::new("Kampala, Uganda");
        let resolver = AddressResolver::new(provider.clone(), geocoder());
        let report = resolver.resolve_directory(input.path(), output.path()).unwrap();

        assert_eq!(
            report,
            BatchReport {
                predicted: 1,
                skipped_existing: 1,
                fallbacks: 1,
            }
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(fs::read_to_string(output.path().join("a.txt")).unwrap(), "0.3476, 32.5825");
        assert_eq!(fs::read_to_string(output.path().join("b.txt")).unwrap(), "0.0, 0.0");
        assert_eq!(fs::read_to_string(output.path().join("c.txt")).unwrap(), "1.0, 1.0");
    }
}
