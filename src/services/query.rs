//! Similarity queries from text.

use std::sync::Arc;
use std::time::Instant;

use super::embedding::SharedEmbedder;
use super::vector_store::{VectorStore, validate_k, validate_vector};
use crate::error::PipelineError;
use crate::models::QueryResults;

/// Embeds a query string and forwards a top-k request to the store.
///
/// Results keep the store's ranking; nothing is re-scored or filtered here.
pub struct QueryClient {
    store: Arc<dyn VectorStore>,
    embedder: SharedEmbedder,
}

impl QueryClient {
    pub fn new(store: Arc<dyn VectorStore>, embedder: SharedEmbedder) -> Self {
        Self { store, embedder }
    }

    pub async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
    ) -> Result<QueryResults, PipelineError> {
        validate_k(k)?;
        let start = Instant::now();

        let vector = self.embedder.embed(text).await?;
        validate_vector(&vector, Some(self.embedder.dimension()))?;

        let mut results = self.search(collection, &vector, k).await?;
        results.query = Some(text.to_string());
        results.duration_ms = start.elapsed().as_millis() as u64;
        Ok(results)
    }

    /// Query with a vector computed elsewhere. Its length must match the
    /// embedder's dimension.
    pub async fn query_vector(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<QueryResults, PipelineError> {
        validate_k(k)?;
        validate_vector(vector, Some(self.embedder.dimension()))?;
        let start = Instant::now();

        let mut results = self.search(collection, vector, k).await?;
        results.duration_ms = start.elapsed().as_millis() as u64;
        Ok(results)
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<QueryResults, PipelineError> {
        let mut hits = self.store.query_similar(collection, vector, k).await?;
        if hits.len() > k {
            tracing::warn!(
                collection,
                k,
                returned = hits.len(),
                "store returned more results than requested; truncating"
            );
            hits.truncate(k);
        }

        Ok(QueryResults {
            collection: collection.to_string(),
            query: None,
            k,
            results: hits,
            duration_ms: 0,
        })
    }
}
