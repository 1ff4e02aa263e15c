//! geoeval Geocoding Layer
//!
//! Clients that turn addresses and panorama ids into coordinates.
//!
//! # Providers
//!
//! - `MockGeocoder`: Deterministic in-memory geocoder for testing
//! - `GoogleGeocoder`: Google Geocoding and Street View metadata APIs
//!
//! Callers that must always produce a coordinate use [`resolve_or_sentinel`],
//! which substitutes `0.0, 0.0` when the service has no answer.
//!
//! # Examples
//!
//! ```
//! use geoeval_domain::Coordinate;
//! use geoeval_geocode::{resolve_or_sentinel, MockGeocoder};
//!
//! let mut geocoder = MockGeocoder::new();
//! geocoder.add_location("Reykjavik, Iceland", Coordinate::new(64.1466, -21.9426).unwrap());
//!
//! assert_eq!(resolve_or_sentinel(&geocoder, "Reykjavik, Iceland").to_string(), "64.1466, -21.9426");
//! assert!(resolve_or_sentinel(&geocoder, "Atlantis").is_sentinel());
//! ```

#![warn(missing_docs)]

pub mod google;

use geoeval_domain::{Coordinate, GeocodeOutcome, Geocoder};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub use google::GoogleGeocoder;

/// Errors that can occur during geocoding
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service refused the request (bad key, API not enabled)
    #[error("Request denied: {0}")]
    Denied(String),

    /// The service is throttling requests (HTTP 429, `OVER_QUERY_LIMIT`)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The service answered with an error status (invalid request, unknown error)
    #[error("Service error: {0}")]
    Service(String),
}

impl GeocodeError {
    /// Whether a later attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeocodeError::Communication(_) | GeocodeError::RateLimited(_))
    }
}

/// Resolve `address`, falling back to the sentinel coordinate
///
/// Both "no match" and service errors are logged and mapped to
/// [`Coordinate::SENTINEL`].
pub fn resolve_or_sentinel<G>(geocoder: &G, address: &str) -> Coordinate
where
    G: Geocoder + ?Sized,
    G::Error: Display,
{
    match geocoder.geocode(address) {
        Ok(GeocodeOutcome::Found(coordinate)) => coordinate,
        Ok(GeocodeOutcome::NotFound) => {
            warn!("No geocoding result for '{}', using sentinel", address);
            Coordinate::SENTINEL
        }
        Err(e) => {
            warn!("Geocoding '{}' failed, using sentinel: {}", address, e);
            Coordinate::SENTINEL
        }
    }
}

/// In-memory geocoder for deterministic testing
///
/// Unknown addresses are reported as not found; addresses registered with
/// [`MockGeocoder::add_failure`] return a communication error.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    locations: HashMap<String, Coordinate>,
    failures: HashSet<String>,
    call_count: Arc<AtomicUsize>,
}

impl MockGeocoder {
    /// Create an empty geocoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known address
    pub fn add_location(&mut self, address: impl Into<String>, coordinate: Coordinate) {
        self.locations.insert(address.into(), coordinate);
    }

    /// Make lookups of `address` fail
    pub fn add_failure(&mut self, address: impl Into<String>) {
        self.failures.insert(address.into());
    }

    /// Get the number of lookups made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Geocoder for MockGeocoder {
    type Error = GeocodeError;

    fn geocode(&self, address: &str) -> Result<GeocodeOutcome, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.failures.contains(address) {
            return Err(GeocodeError::Communication("Mock error".to_string()));
        }
        Ok(self
            .locations
            .get(address)
            .map_or(GeocodeOutcome::NotFound, |c| GeocodeOutcome::Found(*c)))
    }
}
