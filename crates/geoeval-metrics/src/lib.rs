//! geoeval Metrics
//!
//! Offline scoring of geolocation predictions. Everything here is file and
//! arithmetic work; the one model-backed metric takes its embedder as a
//! parameter.
//!
//! # Overview
//!
//! - **Distance**: WGS-84 geodesic error between ground-truth and predicted
//!   coordinates, reported as the share of predictions under each threshold
//! - **Classification**: accuracy, macro recall and macro F1 for the
//!   location, country and continent fields
//! - **Descriptions**: turn `... the image was most likely taken in X, Y[, Z].`
//!   into a `location, country, continent` file
//! - **Score means**: column averages over rubric score files
//! - **Similarity**: mean cosine similarity of embedded description pairs
//! - **Files**: name-based pairing and `.txt` counting
//!
//! Ground truth and predictions live in two directories with one file per
//! sample; files are paired by name.
//!
//! # Usage
//!
//! ```no_run
//! use geoeval_metrics::{evaluate_distances, DistanceConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = evaluate_distances(
//!     Path::new("data/im2gps3k_latlng"),
//!     Path::new("data/predicted_latlng"),
//!     &DistanceConfig::default(),
//! )?;
//! for share in &report.shares {
//!     println!("< {} km: {:.4}", share.km, share.proportion);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod classification;
pub mod description;
pub mod distance;
pub mod error;
pub mod files;
pub mod scores;
pub mod similarity;

pub use classification::{evaluate_classification, field_metrics, ClassificationReport, FieldMetrics, LocationTriple};
pub use description::{continent_for, describe_csv, parse_description, DescribeReport};
pub use distance::{evaluate_distances, geodesic_km, DistanceConfig, DistanceReport, ThresholdShare};
pub use error::MetricsError;
pub use files::{count_txt_files, paired_files, FilePair};
pub use scores::{score_means, ScoreMeans};
pub use similarity::{cosine_similarity, evaluate_similarity, SimilarityReport};
