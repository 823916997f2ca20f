//! Error types for the MemVectorDB client.
//!
//! Each concern gets its own enum: [`EmbeddingError`] for providers,
//! [`StoreError`] for the remote store, [`PipelineError`] for the
//! ingestion and query flows that combine the two, and [`ConfigError`] for
//! configuration files.

use serde::Serialize;
use thiserror::Error;

use crate::utils::retry::Retryable;

/// Coarse failure classes shared by every error type in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or connection failure before a response arrived.
    Transport,
    /// The store answered with a non-success response.
    Remote,
    /// The collection name is already taken.
    Conflict,
    /// The target collection does not exist.
    NotFound,
    /// The embedding provider failed.
    Provider,
    /// The request was rejected before it was sent.
    Validation,
}

/// Errors related to embedding generation.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    ConnectionError(String),

    #[error("embedding provider returned status {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("embedding configuration error: {0}")]
    Configuration(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("model load error: {0}")]
    ModelLoad(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("inference error: {0}")]
    Inference(String),
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError { status, .. } => is_transient_status(*status),
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Errors returned by the remote vector store client.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("collection '{0}' already exists")]
    Conflict(String),

    #[error("collection '{0}' not found")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Transport(_) => ErrorKind::Transport,
            StoreError::Remote { .. } => ErrorKind::Remote,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            StoreError::Remote { status, .. } => is_transient_status(*status),
            StoreError::Conflict(_) | StoreError::NotFound(_) | StoreError::Validation(_) => false,
        }
    }
}

/// Errors from ingestion and query flows.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("validation error: {0}")]
    Validation(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Embedding(_) => ErrorKind::Provider,
            PipelineError::Store(e) => e.kind(),
            PipelineError::Validation(_) => ErrorKind::Validation,
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Rate limiting and gateway failures are worth another attempt.
fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}
