//! One handle over a store and an embedder.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::embedding::{Embedder, SharedEmbedder, create_embedder};
use super::pipeline::IngestionPipeline;
use super::query::QueryClient;
use super::vector_store::{StoreClient, VectorStore, validate_vector};
use crate::error::PipelineError;
use crate::models::{
    CollectionInfo, Config, Distance, Document, Embedding, IngestMode, IngestionReport,
    QueryResults,
};

/// Convenience surface for applications: collections are sized from the
/// embedder, text goes in and ranked hits come out.
pub struct MemVectorClient {
    store: Arc<dyn VectorStore>,
    embedder: SharedEmbedder,
    pipeline: IngestionPipeline,
    queries: QueryClient,
}

impl MemVectorClient {
    pub fn new(store: Arc<dyn VectorStore>, embedder: SharedEmbedder) -> Self {
        Self {
            pipeline: IngestionPipeline::new(store.clone(), embedder.clone()),
            queries: QueryClient::new(store.clone(), embedder.clone()),
            store,
            embedder,
        }
    }

    /// Connect to the configured store with the configured model.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let store = StoreClient::new(&config.store, config.retry.clone())?;
        let embedder = create_embedder(config)?;
        Ok(Self::new(Arc::new(store), embedder).with_progress(config.ingest.show_progress))
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.pipeline = self.pipeline.with_progress(show);
        self
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Create a collection sized for the current embedder.
    pub async fn create_collection(
        &self,
        name: &str,
        distance: Distance,
    ) -> Result<String, PipelineError> {
        let dimension = self.embedder.dimension();
        tracing::debug!(name, dimension, %distance, "creating collection");
        Ok(self
            .store
            .create_collection(name, dimension, distance)
            .await?)
    }

    pub async fn get_collection(&self, name: &str) -> Result<CollectionInfo, PipelineError> {
        Ok(self.store.get_collection(name).await?)
    }

    pub async fn delete_collection(&self, name: &str) -> Result<String, PipelineError> {
        Ok(self.store.delete_collection(name).await?)
    }

    pub async fn list_embeddings(&self, collection: &str) -> Result<Vec<Embedding>, PipelineError> {
        Ok(self.store.list_embeddings(collection).await?)
    }

    /// Embed and insert a single text, returning its new id. Errors are
    /// propagated, not collected. The vector must match the collection's
    /// dimension before anything is sent.
    pub async fn add_text(
        &self,
        collection: &str,
        text: &str,
        metadata: Map<String, Value>,
    ) -> Result<String, PipelineError> {
        let dimension = self.pipeline.check_dimension(collection).await?;

        let document = Document {
            id: None,
            content: text.to_string(),
            metadata,
        };
        let vector = self.embedder.embed(&document.content).await?;
        validate_vector(&vector, Some(dimension))?;

        let id = Embedding::generate_id();
        let embedding = Embedding::new(id.clone(), vector, document.stored_metadata());
        self.store.insert_embedding(collection, embedding).await?;
        Ok(id)
    }

    pub async fn add_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
        mode: IngestMode,
    ) -> Result<IngestionReport, PipelineError> {
        self.pipeline.ingest(collection, documents, mode).await
    }

    pub async fn query(
        &self,
        collection: &str,
        text: &str,
        k: usize,
    ) -> Result<QueryResults, PipelineError> {
        self.queries.query(collection, text, k).await
    }

    pub async fn query_vector(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<QueryResults, PipelineError> {
        self.queries.query_vector(collection, vector, k).await
    }
}
