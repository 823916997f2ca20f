//! Deterministic embedder for tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Embedder;
use crate::error::EmbeddingError;

/// Derives vectors from the text bytes unless a vector was pinned with
/// [`FakeEmbedder::with_vector`].
#[derive(Debug, Default)]
pub struct FakeEmbedder {
    dimension: usize,
    pinned: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.pinned.insert(text.to_string(), vector);
        self
    }

    /// Embedding `text` fails with a provider error.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(text) {
            return Err(EmbeddingError::ServerError {
                status: 500,
                message: format!("cannot embed {text:?}"),
            });
        }
        if let Some(vector) = self.pinned.get(text) {
            return Ok(vector.clone());
        }

        let seed: u32 = text.bytes().map(u32::from).sum();
        Ok((0..self.dimension)
            .map(|i| ((seed + 31 * i as u32) % 97) as f32 / 97.0 + 0.01)
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}
