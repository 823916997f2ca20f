//! Client library for MemVectorDB-style vector stores.
//!
//! Text goes through an [`services::Embedder`] (a hosted embeddings API or
//! a local ONNX model) and lands in a remote collection through
//! [`services::StoreClient`]. [`services::MemVectorClient`] bundles both
//! behind one handle.

pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::{ErrorKind, PipelineError, StoreError};
pub use models::{Config, OutputFormat};
pub use services::MemVectorClient;
