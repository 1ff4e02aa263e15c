//! Google Maps Platform client
//!
//! Two lookups share one HTTP client:
//!
//! - Geocoding API: free-text address to coordinate
//! - Street View metadata API: panorama id to coordinate
//!
//! Both answer with a JSON body carrying a `status` field. `OK` means a
//! result, `ZERO_RESULTS` (and `NOT_FOUND` for panoramas) means no match,
//! anything else is an error. HTTP 429 and `OVER_QUERY_LIMIT` are retried
//! with the same backoff as transport failures.

use crate::GeocodeError;
use geoeval_domain::{Coordinate, GeocodeOutcome, Geocoder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api";

/// Default timeout for lookups (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Google Geocoding / Street View metadata client
pub struct GoogleGeocoder {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    status: String,
    #[serde(default)]
    location: Option<LatLng>,
    #[serde(default)]
    error_message: Option<String>,
}

impl GoogleGeocoder {
    /// Create a client for `endpoint` authenticated with `api_key`
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a client whose API key is read from the environment variable `key_var`
    pub fn from_env(endpoint: impl Into<String>, key_var: &str) -> Result<Self, GeocodeError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| GeocodeError::Denied(format!("environment variable {} is not set", key_var)))?;
        Ok(Self::new(endpoint, api_key))
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Geocode a free-text address
    pub async fn lookup_address(&self, address: &str) -> Result<GeocodeOutcome, GeocodeError> {
        self.lookup::<GeocodeResponse>("geocode/json", &[("address", address)])
            .await
    }

    /// Look up the location of a Street View panorama
    pub async fn lookup_pano(&self, pano_id: &str) -> Result<GeocodeOutcome, GeocodeError> {
        self.lookup::<MetadataResponse>("streetview/metadata", &[("pano", pano_id)])
            .await
    }

    async fn lookup<R>(&self, path: &str, params: &[(&str, &str)]) -> Result<GeocodeOutcome, GeocodeError>
    where
        R: DeserializeOwned + StatusBody,
    {
        let url = format!("{}/{}", self.endpoint, path);

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.attempt::<R>(&url, params).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                debug!("Lookup attempt {} failed, retrying in {:?}", attempts, delay);
                tokio::time::sleep(delay).await;
            }
        }

        let error = last_error
            .unwrap_or_else(|| GeocodeError::Communication("Max retries exceeded".to_string()));
        warn!("Lookup failed after {} attempts: {}", attempts, error);
        Err(error)
    }

    async fn attempt<R>(&self, url: &str, params: &[(&str, &str)]) -> Result<GeocodeOutcome, GeocodeError>
    where
        R: DeserializeOwned + StatusBody,
    {
        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited(format!("HTTP {}", status)));
        }
        if status.is_client_error() {
            return Err(GeocodeError::Service(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(GeocodeError::Communication(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Communication(format!("Failed to read body: {}", e)))?;
        let parsed: R = serde_json::from_str(&body)
            .map_err(|e| GeocodeError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        parsed.into_outcome()
    }
}

/// Run `future` to completion from synchronous code
///
/// Inside a multi-thread runtime the worker is handed over with
/// `block_in_place`. A current-thread runtime cannot block its only worker,
/// so the request runs on a scoped thread with its own runtime.
fn block_on<F>(future: F) -> Result<GeocodeOutcome, GeocodeError>
where
    F: Future<Output = Result<GeocodeOutcome, GeocodeError>> + Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(move || standalone_runtime()?.block_on(future))
                .join()
                .unwrap_or_else(|_| Err(GeocodeError::Communication("lookup thread panicked".to_string())))
        }),
        Err(_) => standalone_runtime()?.block_on(future),
    }
}

fn standalone_runtime() -> Result<Runtime, GeocodeError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| GeocodeError::Communication(format!("Failed to start runtime: {}", e)))
}

/// A response body whose `status` field decides the outcome
trait StatusBody {
    fn into_outcome(self) -> Result<GeocodeOutcome, GeocodeError>;
}

fn status_error(status: String, message: Option<String>) -> GeocodeError {
    let detail = match message {
        Some(message) => format!("{}: {}", status, message),
        None => status.clone(),
    };
    match status.as_str() {
        "REQUEST_DENIED" => GeocodeError::Denied(detail),
        "OVER_QUERY_LIMIT" => GeocodeError::RateLimited(detail),
        _ => GeocodeError::Service(detail),
    }
}

fn to_coordinate(location: LatLng) -> Result<Coordinate, GeocodeError> {
    Coordinate::new(location.lat, location.lng)
        .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))
}

impl StatusBody for GeocodeResponse {
    fn into_outcome(self) -> Result<GeocodeOutcome, GeocodeError> {
        match self.status.as_str() {
            "OK" => {
                let first = self.results.into_iter().next().ok_or_else(|| {
                    GeocodeError::InvalidResponse("status OK without results".to_string())
                })?;
                Ok(GeocodeOutcome::Found(to_coordinate(first.geometry.location)?))
            }
            "ZERO_RESULTS" => Ok(GeocodeOutcome::NotFound),
            _ => Err(status_error(self.status, self.error_message)),
        }
    }
}

impl StatusBody for MetadataResponse {
    fn into_outcome(self) -> Result<GeocodeOutcome, GeocodeError> {
        match self.status.as_str() {
            "OK" => {
                let location = self.location.ok_or_else(|| {
                    GeocodeError::InvalidResponse("status OK without location".to_string())
                })?;
                Ok(GeocodeOutcome::Found(to_coordinate(location)?))
            }
            "ZERO_RESULTS" | "NOT_FOUND" => Ok(GeocodeOutcome::NotFound),
            _ => Err(status_error(self.status, self.error_message)),
        }
    }
}

impl Geocoder for GoogleGeocoder {
    type Error = GeocodeError;

    fn geocode(&self, address: &str) -> Result<GeocodeOutcome, Self::Error> {
        // Blocking wrapper for async function
        block_on(self.lookup_address(address))
    }
}
