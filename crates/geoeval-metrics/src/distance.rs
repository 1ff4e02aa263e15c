//! Geodesic distance between ground-truth and predicted coordinates

use crate::files::{first_line, paired_files};
use crate::MetricsError;
use geoeval_domain::Coordinate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// WGS-84 semi-major axis in metres
const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Mean earth radius in kilometres, used when Vincenty does not converge
const MEAN_RADIUS_KM: f64 = 6_371.008_8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Default thresholds: street, city and country/region scale
pub const DEFAULT_THRESHOLDS_KM: [f64; 3] = [1.0, 25.0, 750.0];

/// Distance in kilometres on the WGS-84 ellipsoid
///
/// Uses Vincenty's inverse formula. Nearly antipodal points, where the
/// iteration does not converge, fall back to the great-circle distance.
pub fn geodesic_km(a: Coordinate, b: Coordinate) -> f64 {
    vincenty_km(a, b).unwrap_or_else(|| {
        debug!("Vincenty did not converge for {} / {}, using great circle", a, b);
        great_circle_km(a, b)
    })
}

fn vincenty_km(p1: Coordinate, p2: Coordinate) -> Option<f64> {
    let f = WGS84_F;
    let a = WGS84_A;
    let b = (1.0 - f) * a;

    let l = (p2.lng - p1.lng).to_radians();
    let u1 = ((1.0 - f) * p1.lat.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * p2.lat.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // Coincident points
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos_sq_alpha is 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if (lambda - previous).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            let metres = b * big_a * (sigma - delta_sigma);
            return metres.is_finite().then_some(metres / 1000.0);
        }
    }

    None
}

/// Haversine distance on a sphere of mean earth radius
pub fn great_circle_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * MEAN_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Thresholds to report, in kilometres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// A prediction counts for a threshold when its error is strictly below it
    pub thresholds_km: Vec<f64>,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            thresholds_km: DEFAULT_THRESHOLDS_KM.to_vec(),
        }
    }
}

impl DistanceConfig {
    /// Validate the thresholds
    pub fn validate(&self) -> Result<(), String> {
        if self.thresholds_km.is_empty() {
            return Err("at least one threshold is required".to_string());
        }
        if let Some(bad) = self.thresholds_km.iter().find(|t| !t.is_finite() || **t <= 0.0) {
            return Err(format!("threshold must be a positive number of km, got {}", bad));
        }
        Ok(())
    }
}

/// Share of predictions within one threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdShare {
    /// Threshold in kilometres
    pub km: f64,
    /// Predictions strictly closer than `km`
    pub within: usize,
    /// `within / evaluated`
    pub proportion: f64,
}

/// Result of comparing a prediction directory against ground truth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceReport {
    /// Pairs with two readable coordinates
    pub evaluated: usize,
    /// Pairs dropped because a file did not hold a coordinate
    pub skipped: usize,
    /// One entry per configured threshold
    pub shares: Vec<ThresholdShare>,
}

impl DistanceReport {
    /// Build a report from per-pair distances
    pub fn from_distances(distances: &[f64], skipped: usize, config: &DistanceConfig) -> Self {
        let evaluated = distances.len();
        let shares = config
            .thresholds_km
            .iter()
            .map(|&km| {
                let within = distances.iter().filter(|d| **d < km).count();
                ThresholdShare {
                    km,
                    within,
                    proportion: if evaluated == 0 {
                        0.0
                    } else {
                        within as f64 / evaluated as f64
                    },
                }
            })
            .collect();

        Self {
            evaluated,
            skipped,
            shares,
        }
    }
}

/// Compare every same-named pair of coordinate files
///
/// Each file holds `lat, lng` on its first line. Pairs where either side is
/// unreadable are skipped with a warning.
pub fn evaluate_distances(
    truth_dir: &Path,
    prediction_dir: &Path,
    config: &DistanceConfig,
) -> Result<DistanceReport, MetricsError> {
    config.validate().map_err(MetricsError::InvalidFormat)?;

    let mut distances = Vec::new();
    let mut skipped = 0;
    for pair in paired_files(truth_dir, prediction_dir)? {
        let truth = read_coordinate(&pair.truth);
        let prediction = read_coordinate(&pair.prediction);
        match (truth, prediction) {
            (Ok(truth), Ok(prediction)) => {
                let km = geodesic_km(truth, prediction);
                debug!("{}: {:.3} km", pair.name, km);
                distances.push(km);
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Skipping {}: {}", pair.name, e);
                skipped += 1;
            }
        }
    }

    if distances.is_empty() {
        return Err(MetricsError::Empty("no matching coordinate files".to_string()));
    }

    let report = DistanceReport::from_distances(&distances, skipped, config);
    info!("Evaluated {} coordinate pairs", report.evaluated);
    Ok(report)
}

fn read_coordinate(path: &Path) -> Result<Coordinate, MetricsError> {
    let line = first_line(path)?;
    line.parse()
        .map_err(|e| MetricsError::InvalidFormat(format!("{}: '{}': {}", path.display(), line, e)))
}
