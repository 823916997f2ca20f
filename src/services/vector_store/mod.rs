//! Vector store abstraction.
//!
//! [`VectorStore`] is the seam between the pipeline and the remote store.
//! [`StoreClient`] implements it over the MemVectorDB HTTP/JSON protocol.

mod http;
#[cfg(test)]
pub(crate) mod memory;

pub use http::{Endpoint, StoreClient};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{CollectionInfo, CollectionSummary, Distance, Embedding, ScoredEmbedding};

/// Collection CRUD plus insert and similarity search.
///
/// Every method is one remote round trip (reads may be retried).
/// `delete_collection` on a missing name is an error
/// ([`StoreError::NotFound`]), never a silent no-op.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection. Fails with [`StoreError::Conflict`] if the name
    /// is taken; returns the store's status message.
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<String, StoreError>;

    /// The full collection, every stored embedding included.
    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, StoreError>;

    /// Dimension and distance only; stored embeddings are not kept in
    /// memory.
    async fn describe_collection(&self, name: &str) -> Result<CollectionSummary, StoreError>;

    async fn delete_collection(&self, name: &str) -> Result<String, StoreError>;

    async fn insert_embedding(
        &self,
        collection: &str,
        embedding: Embedding,
    ) -> Result<(), StoreError>;

    /// Insert many embeddings in one call. On error nothing can be assumed
    /// about how many records landed.
    async fn batch_insert_embeddings(
        &self,
        collection: &str,
        embeddings: Vec<Embedding>,
    ) -> Result<(), StoreError>;

    async fn list_embeddings(&self, collection: &str) -> Result<Vec<Embedding>, StoreError>;

    /// At most `k` hits, most similar first.
    async fn query_similar(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEmbedding>, StoreError>;
}

pub fn validate_collection_params(name: &str, dimension: usize) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation(
            "collection name must not be empty".to_string(),
        ));
    }
    if dimension == 0 {
        return Err(StoreError::Validation(
            "dimension must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Reject empty or non-finite vectors, and length mismatches when the
/// expected dimension is known.
pub fn validate_vector(vector: &[f32], expected: Option<usize>) -> Result<(), StoreError> {
    if vector.is_empty() {
        return Err(StoreError::Validation("vector must not be empty".to_string()));
    }
    if let Some(dimension) = expected
        && vector.len() != dimension
    {
        return Err(StoreError::Validation(format!(
            "vector has {} dimensions, collection expects {dimension}",
            vector.len()
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(StoreError::Validation(
            "vector contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_k(k: usize) -> Result<(), StoreError> {
    if k == 0 {
        return Err(StoreError::Validation("k must be a positive integer".to_string()));
    }
    Ok(())
}
