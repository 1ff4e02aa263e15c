//! geoeval Domain Layer
//!
//! Value objects and service traits shared by every geoeval crate. Like any
//! domain layer it has no external dependencies: infrastructure (CSV
//! streaming, HTTP clients) lives in the other crates and plugs in through the
//! traits defined here.
//!
//! ## Key Concepts
//!
//! - **Candidate**: one `(key, values...)` tuple pulled out of a payload round
//! - **QuotaTracker**: per-key bounded collection with a pending-key set
//! - **Coordinate**: a latitude/longitude pair, with the `0.0, 0.0` sentinel
//! - **CompletionProvider / EmbeddingProvider / Geocoder**: black-box services
//!   the pipeline calls

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod coordinate;
pub mod quota;
pub mod traits;

pub use candidate::Candidate;
pub use coordinate::{Coordinate, CoordinateParseError};
pub use quota::{Offer, QuotaTracker};
pub use traits::{CompletionProvider, EmbeddingProvider, GeocodeOutcome, Geocoder};
