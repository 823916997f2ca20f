//! Provider-agnostic text embedding.
//!
//! An [`Embedder`] turns text into a vector of a fixed, known-in-advance
//! dimension. The dimension comes from the [`ModelTable`] rather than from
//! the store, so a collection can be created before anything is embedded.

#[cfg(test)]
pub(crate) mod fake;
mod local;
mod registry;
mod remote;

pub use local::LocalModelEmbedder;
pub use registry::ModelTable;
pub use remote::RemoteApiEmbedder;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::EmbeddingError;
use crate::models::{Config, Provider};

/// Produces fixed-size vectors from text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text. Empty input is passed through to the provider.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;

    /// Model identifier, for logs and status output.
    fn model_name(&self) -> &str;
}

pub type SharedEmbedder = Arc<dyn Embedder>;

/// Build the embedder selected by `config.embedding`.
pub fn create_embedder(config: &Config) -> Result<SharedEmbedder, EmbeddingError> {
    let table = ModelTable::from_config(config);
    let spec = table
        .resolve(config.embedding.provider, &config.embedding.model)?
        .clone();

    match spec.provider {
        Provider::Remote => {
            let embedder = RemoteApiEmbedder::new(spec, &config.embedding, config.retry.clone())?;
            Ok(Arc::new(embedder))
        }
        Provider::Local => {
            let model_dir = match config.embedding.model_dir.clone() {
                Some(dir) => dir,
                None => default_model_dir(&spec.model)?,
            };
            let embedder =
                LocalModelEmbedder::load(spec, &model_dir, config.embedding.max_tokens as usize)?;
            Ok(Arc::new(embedder))
        }
    }
}

/// `<data dir>/memvectordb-client/models/<model>`
pub fn default_model_dir(model: &str) -> Result<PathBuf, EmbeddingError> {
    dirs::data_dir()
        .map(|p| p.join("memvectordb-client").join("models").join(model))
        .ok_or_else(|| {
            EmbeddingError::Configuration("could not determine data directory".to_string())
        })
}
