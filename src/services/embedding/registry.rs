//! Model table: embedding dimension per (provider, model).

use crate::error::EmbeddingError;
use crate::models::{Config, ModelSpec, Provider};

/// Dimension lookup for (provider, model) pairs.
///
/// Starts from a small built-in table; entries from the config file are
/// layered on top and win on conflict.
#[derive(Debug, Clone)]
pub struct ModelTable {
    entries: Vec<ModelSpec>,
}

impl Default for ModelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelTable {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ModelSpec::new(Provider::Remote, "text-embedding-3-small", 1536),
                ModelSpec::new(Provider::Remote, "text-embedding-3-large", 1024)
                    .sending_dimensions(),
                ModelSpec::new(Provider::Remote, "text-embedding-ada-002", 1536),
                ModelSpec::new(Provider::Local, "multi-qa-MiniLM-L6-cos-v1", 384),
                ModelSpec::new(Provider::Local, "all-MiniLM-L6-v2", 384),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::builtin().with_entries(config.models.iter().cloned())
    }

    /// Add entries, replacing any existing row for the same pair.
    #[must_use]
    pub fn with_entries(mut self, extra: impl IntoIterator<Item = ModelSpec>) -> Self {
        for spec in extra {
            self.entries
                .retain(|e| !(e.provider == spec.provider && e.model == spec.model));
            self.entries.push(spec);
        }
        self
    }

    pub fn lookup(&self, provider: Provider, model: &str) -> Option<&ModelSpec> {
        self.entries
            .iter()
            .find(|e| e.provider == provider && e.model == model)
    }

    pub fn resolve(&self, provider: Provider, model: &str) -> Result<&ModelSpec, EmbeddingError> {
        self.lookup(provider, model).ok_or_else(|| {
            EmbeddingError::Configuration(format!(
                "no dimension known for {provider} model '{model}'; add it under [[models]]"
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.entries.iter()
    }
}
