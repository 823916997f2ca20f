//! Document ingestion: embed, attach metadata, insert.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;

use super::embedding::SharedEmbedder;
use super::vector_store::{VectorStore, validate_vector};
use crate::error::PipelineError;
use crate::models::{Document, Embedding, IngestMode, IngestionReport, ItemOutcome};

/// Turns documents into stored embeddings under a streaming or batch
/// delivery policy.
pub struct IngestionPipeline {
    store: Arc<dyn VectorStore>,
    embedder: SharedEmbedder,
    show_progress: bool,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn VectorStore>, embedder: SharedEmbedder) -> Self {
        Self {
            store,
            embedder,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while ingesting.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Ingest `documents` into `collection`.
    ///
    /// Streaming runs always return a report; per-document failures are
    /// recorded in it. Batch runs either insert every document or return
    /// the first error, having inserted nothing.
    pub async fn ingest(
        &self,
        collection: &str,
        documents: Vec<Document>,
        mode: IngestMode,
    ) -> Result<IngestionReport, PipelineError> {
        let start = Instant::now();
        let dimension = self.check_dimension(collection).await?;

        let mut report = if documents.is_empty() {
            IngestionReport::new(collection, mode)
        } else {
            match mode {
                IngestMode::Streaming => {
                    self.ingest_streaming(collection, documents, dimension)
                        .await
                }
                IngestMode::Batch => self.ingest_batch(collection, documents, dimension).await?,
            }
        };

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            collection,
            %mode,
            succeeded = report.succeeded,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "ingestion finished"
        );
        Ok(report)
    }

    /// Look the collection up once and make sure the embedder fits it.
    pub(crate) async fn check_dimension(&self, collection: &str) -> Result<usize, PipelineError> {
        let info = self.store.describe_collection(collection).await?;
        let expected = self.embedder.dimension();
        if info.dimension != expected {
            return Err(PipelineError::Validation(format!(
                "collection '{collection}' has dimension {}, but model '{}' produces {expected}",
                info.dimension,
                self.embedder.model_name()
            )));
        }
        Ok(info.dimension)
    }

    async fn ingest_streaming(
        &self,
        collection: &str,
        documents: Vec<Document>,
        dimension: usize,
    ) -> IngestionReport {
        let mut report = IngestionReport::new(collection, IngestMode::Streaming);
        let pb = self.progress_bar(documents.len());

        for (index, document) in documents.into_iter().enumerate() {
            let id = document.id.clone().unwrap_or_else(Embedding::generate_id);

            let result = match self.embed_document(&document, id.clone(), dimension).await {
                Ok(embedding) => self
                    .store
                    .insert_embedding(collection, embedding)
                    .await
                    .map_err(PipelineError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.record(ItemOutcome::inserted(index, id)),
                Err(e) => {
                    tracing::warn!(collection, index, id = %id, error = %e, "document not ingested");
                    report.record(ItemOutcome::failed(index, id, &e));
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        report
    }

    async fn ingest_batch(
        &self,
        collection: &str,
        documents: Vec<Document>,
        dimension: usize,
    ) -> Result<IngestionReport, PipelineError> {
        let pb = self.progress_bar(documents.len());
        let mut embeddings = Vec::with_capacity(documents.len());

        for document in &documents {
            let id = document.id.clone().unwrap_or_else(Embedding::generate_id);
            match self.embed_document(document, id, dimension).await {
                Ok(embedding) => embeddings.push(embedding),
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let ids: Vec<String> = embeddings.iter().map(|e| e.id.clone()).collect();
        tracing::debug!(collection, count = ids.len(), "sending batch insert");
        self.store
            .batch_insert_embeddings(collection, embeddings)
            .await?;

        let mut report = IngestionReport::new(collection, IngestMode::Batch);
        for (index, id) in ids.into_iter().enumerate() {
            report.record(ItemOutcome::inserted(index, id));
        }
        Ok(report)
    }

    async fn embed_document(
        &self,
        document: &Document,
        id: String,
        dimension: usize,
    ) -> Result<Embedding, PipelineError> {
        let vector = self.embedder.embed(&document.content).await?;
        validate_vector(&vector, Some(dimension))?;
        Ok(Embedding::new(id, vector, document.stored_metadata()))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
