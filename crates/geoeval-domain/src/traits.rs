//! Trait definitions for external services
//!
//! These traits define the boundaries between evaluation logic and the
//! services it calls. Implementations live in other crates.

use crate::Coordinate;

/// Trait for text completion services
///
/// Implemented by the infrastructure layer (geoeval-llm)
pub trait CompletionProvider {
    /// Error type for completion calls
    type Error;

    /// Generate a completion for `prompt`
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate a completion with a separate system instruction
    ///
    /// Providers without a system role fold it into the prompt.
    fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        self.generate(&format!("{}\n\n{}", system, prompt))
    }
}

/// Trait for text embedding services
///
/// Implemented by the infrastructure layer (geoeval-llm)
pub trait EmbeddingProvider {
    /// Error type for embedding calls
    type Error;

    /// Embed `text` as a dense vector
    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;
}

/// Answer from a geocoding service
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    /// The service resolved the query to a coordinate
    Found(Coordinate),
    /// The service explicitly reported no match
    NotFound,
}

/// Trait for geocoding services
///
/// Implemented by the infrastructure layer (geoeval-geocode)
pub trait Geocoder {
    /// Error type for geocoding calls
    type Error;

    /// Resolve a free-text address
    fn geocode(&self, address: &str) -> Result<GeocodeOutcome, Self::Error>;
}
