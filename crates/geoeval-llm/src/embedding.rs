//! Deterministic embeddings for tests and offline runs
//!
//! [`MockEmbedder`] hashes each lowercase word into one of `dimension`
//! buckets, so texts sharing vocabulary point in similar directions and
//! identical texts embed identically.

use crate::LlmError;
use geoeval_domain::EmbeddingProvider;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bag-of-words embedding model
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimension: usize,
    call_count: Arc<AtomicUsize>,
}

impl MockEmbedder {
    /// Create an embedder producing vectors of `dimension` values (at least 1)
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of embed calls made
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn bucket(&self, word: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingProvider for MockEmbedder {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let mut embedding = vec![0.0f32; self.dimension];
        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase);
        for word in words {
            embedding[self.bucket(&word)] += 1.0;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude == 0.0 {
            return Err(LlmError::InvalidResponse("nothing to embed".to_string()));
        }
        for value in &mut embedding {
            *value /= magnitude;
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("The Eiffel Tower, Paris").unwrap();
        let b = embedder.embed("the eiffel tower paris").unwrap();
        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
        assert_eq!(embedder.call_count(), 2);
    }

    #[test]
    fn test_shared_words_are_closer() {
        let embedder = MockEmbedder::default();
        let truth = embedder.embed("snowy mountains above a quiet lake").unwrap();
        let close = embedder.embed("quiet lake below snowy mountains").unwrap();
        let far = embedder.embed("busy market street with tuk tuks").unwrap();
        assert!(dot(&truth, &close) > dot(&truth, &far));
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let embedder = MockEmbedder::new(8);
        assert!(matches!(embedder.embed("  ,. "), Err(LlmError::InvalidResponse(_))));
    }
}
