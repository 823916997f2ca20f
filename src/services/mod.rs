mod client;
pub mod embedding;
mod pipeline;
mod query;
pub mod vector_store;

pub use client::MemVectorClient;
pub use embedding::{
    Embedder, LocalModelEmbedder, ModelTable, RemoteApiEmbedder, SharedEmbedder, create_embedder,
};
pub use pipeline::IngestionPipeline;
pub use query::QueryClient;
pub use vector_store::{Endpoint, StoreClient, VectorStore};
