//! In-process store used by pipeline and query tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{VectorStore, validate_collection_params, validate_k, validate_vector};
use crate::error::StoreError;
use crate::models::{CollectionInfo, CollectionSummary, Distance, Embedding, ScoredEmbedding};

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, CollectionInfo>,
    failing_ids: HashSet<String>,
    fail_batches: bool,
    batch_calls: usize,
    insert_calls: usize,
    query_calls: usize,
    full_reads: usize,
}

/// Keeps collections in a map and ranks queries by brute force.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make single inserts of `id` fail with a remote error.
    pub fn fail_insert_of(&self, id: &str) {
        self.state.lock().unwrap().failing_ids.insert(id.to_string());
    }

    /// Make every batch insert fail with a remote error.
    pub fn fail_batches(&self) {
        self.state.lock().unwrap().fail_batches = true;
    }

    pub fn count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .map_or(0, |c| c.embeddings.len())
    }

    pub fn batch_calls(&self) -> usize {
        self.state.lock().unwrap().batch_calls
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }

    pub fn query_calls(&self) -> usize {
        self.state.lock().unwrap().query_calls
    }

    /// Reads that returned every stored embedding.
    pub fn full_reads(&self) -> usize {
        self.state.lock().unwrap().full_reads
    }

    fn snapshot(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        Distance::Dot => dot,
        Distance::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        // Negated so that higher is always better.
        Distance::Euclidean => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f32>()
            .sqrt(),
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<String, StoreError> {
        validate_collection_params(name, dimension)?;
        let mut state = self.state.lock().unwrap();
        if state.collections.contains_key(name) {
            return Err(StoreError::Conflict(name.to_string()));
        }
        state.collections.insert(
            name.to_string(),
            CollectionInfo {
                name: name.to_string(),
                dimension,
                distance,
                embeddings: Vec::new(),
            },
        );
        Ok(format!("Collection created: \"{name}\""))
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        self.state.lock().unwrap().full_reads += 1;
        self.snapshot(name)
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionSummary, StoreError> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(name)
            .map(|info| CollectionSummary {
                name: info.name.clone(),
                dimension: info.dimension,
                distance: info.distance,
            })
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn delete_collection(&self, name: &str) -> Result<String, StoreError> {
        self.state
            .lock()
            .unwrap()
            .collections
            .remove(name)
            .map(|_| format!("Collection deleted: \"{name}\""))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn insert_embedding(
        &self,
        collection: &str,
        embedding: Embedding,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.failing_ids.contains(&embedding.id) {
            return Err(StoreError::Remote {
                status: 500,
                message: format!("insert of {} rejected", embedding.id),
            });
        }
        let info = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        validate_vector(&embedding.vector, Some(info.dimension))?;
        info.embeddings.push(embedding);
        Ok(())
    }

    async fn batch_insert_embeddings(
        &self,
        collection: &str,
        embeddings: Vec<Embedding>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.batch_calls += 1;
        if state.fail_batches {
            return Err(StoreError::Remote {
                status: 500,
                message: "batch rejected".to_string(),
            });
        }
        let info = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        for embedding in &embeddings {
            validate_vector(&embedding.vector, Some(info.dimension))?;
        }
        info.embeddings.extend(embeddings);
        Ok(())
    }

    async fn list_embeddings(&self, collection: &str) -> Result<Vec<Embedding>, StoreError> {
        Ok(self.get_collection(collection).await?.embeddings)
    }

    async fn query_similar(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEmbedding>, StoreError> {
        self.state.lock().unwrap().query_calls += 1;
        validate_k(k)?;
        let info = self.snapshot(collection)?;
        validate_vector(vector, Some(info.dimension))?;

        let mut hits: Vec<ScoredEmbedding> = info
            .embeddings
            .into_iter()
            .map(|e| ScoredEmbedding {
                score: Some(score(info.distance, vector, &e.vector)),
                id: e.id,
                vector: e.vector,
                metadata: e.metadata,
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}
