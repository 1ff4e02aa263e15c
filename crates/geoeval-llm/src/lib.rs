//! geoeval Completion Service Layer
//!
//! Clients for text completion services and the bounded-retry validators
//! built on top of them.
//!
//! # Architecture
//!
//! This crate implements the `CompletionProvider` and `EmbeddingProvider`
//! traits from `geoeval-domain`. The validators (`CoordinatePredictor`,
//! `AddressResolver`, `RubricJudge`) are generic over any provider, so they
//! are tested against `MockProvider` and run against `OpenAiProvider`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `MockEmbedder`: Bag-of-words embeddings for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions and embeddings API
//!
//! # Examples
//!
//! ```
//! use geoeval_llm::{CoordinatePredictor, MockProvider};
//!
//! let provider = MockProvider::new("35.6586, 139.7454");
//! let predictor = CoordinatePredictor::new(provider);
//! let prediction = predictor.predict("A red lattice tower over a dense city");
//! assert_eq!(prediction.coordinate.to_string(), "35.6586, 139.7454");
//! assert!(!prediction.fallback);
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod judge;
pub mod openai;
pub mod predictor;
pub mod resolver;

use geoeval_domain::CompletionProvider;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use embedding::MockEmbedder;
pub use judge::{JudgeReport, RubricDimension, RubricJudge, RubricScores, Score};
pub use openai::OpenAiProvider;
pub use predictor::{BatchReport, CoordinatePredictor, Prediction};
pub use resolver::{AddressResolver, Resolution};

/// Errors that can occur during completion calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Reading inputs or writing results failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<std::io::Error> for LlmError {
    fn from(e: std::io::Error) -> Self {
        LlmError::Io(e.to_string())
    }
}

/// Mock completion provider for deterministic testing
///
/// Answers come from, in order: the queue of scripted answers, the
/// per-prompt table, then the fixed default. No network calls are made.
///
/// # Examples
///
/// ```
/// use geoeval_llm::MockProvider;
/// use geoeval_domain::CompletionProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Scripted sequence, e.g. for retry tests
/// let provider = MockProvider::default();
/// provider.queue_response("not a coordinate");
/// provider.queue_response("1.5, 2.5");
/// assert_eq!(provider.generate("p").unwrap(), "not a coordinate");
/// assert_eq!(provider.generate("p").unwrap(), "1.5, 2.5");
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    queue: Arc<Mutex<VecDeque<Option<String>>>>,
    call_count: Arc<Mutex<usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a prompt containing `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(needle.into(), response.into());
    }

    /// Queue a response served before any other
    pub fn queue_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(Some(response.into()));
    }

    /// Queue a failed call
    pub fn queue_error(&self) {
        lock(&self.queue).push_back(None);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *lock(&self.call_count) += 1;

        if let Some(next) = lock(&self.queue).pop_front() {
            return next.ok_or_else(|| LlmError::Other("Mock error".to_string()));
        }

        let responses = lock(&self.responses);
        let matched = responses
            .iter()
            .filter(|(needle, _)| prompt.contains(needle.as_str()))
            .max_by_key(|(needle, _)| needle.len());
        if let Some((_, response)) = matched {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }
}
