mod collection;
mod config;
mod document;
mod embedding;
mod report;
mod search;

pub use collection::{CollectionInfo, CollectionSummary, Distance};
pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_STORE_URL, ENV_API_KEY,
    ENV_STORE_URL, EmbeddingConfig, IngestConfig, ModelSpec, Provider, QueryConfig, StoreConfig,
};
pub use document::Document;
pub use embedding::{Embedding, Metadata, ScoredEmbedding, TEXT_KEY};
pub use report::{IngestMode, IngestionReport, ItemFailure, ItemOutcome};
pub use search::{OutputFormat, QueryResults};

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
