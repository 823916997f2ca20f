use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::report::IngestMode;
use super::search::OutputFormat;
use crate::error::ConfigError;
use crate::utils::retry::RetryConfig;

pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

pub const ENV_STORE_URL: &str = "MVDB_URL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub query: QueryConfig,

    /// Extra model table entries; they take precedence over the built-ins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelSpec>,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("memvectordb-client").join("config.toml"))
    }

    /// Load the user config (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `MVDB_URL` replaces the store URL; `OPENAI_API_KEY` only fills a
    /// missing key.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.is_empty()) {
            self.store.url = url;
        }
        if self.embedding.api_key.is_none()
            && let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty())
        {
            self.embedding.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.url must not be empty".to_string(),
            ));
        }
        if self.store.timeout_secs == 0 || self.embedding.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model must not be empty".to_string(),
            ));
        }
        if self.query.default_k == 0 {
            return Err(ConfigError::ValidationError(
                "query.default_k must be positive".to_string(),
            ));
        }
        if let Some(spec) = self.models.iter().find(|m| m.dimension == 0) {
            return Err(ConfigError::ValidationError(format!(
                "model '{}' has a zero dimension",
                spec.model
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Per-request timeout for store calls.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_store_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            timeout_secs: default_store_timeout(),
        }
    }
}

/// Embedding backend family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hosted OpenAI-compatible embeddings API.
    #[default]
    #[serde(alias = "openai")]
    Remote,
    /// ONNX model loaded from disk.
    #[serde(alias = "sentence_transformers")]
    Local,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Remote => write!(f, "remote"),
            Provider::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" | "openai" => Ok(Provider::Remote),
            "local" | "sentence_transformers" => Ok(Provider::Local),
            _ => Err(format!("unknown embedding provider: {s}")),
        }
    }
}

/// One row of the model table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
    pub dimension: usize,

    /// Ask the API for `dimension` explicitly (shortened embeddings).
    #[serde(default)]
    pub send_dimensions: bool,
}

impl ModelSpec {
    pub fn new(provider: Provider, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension,
            send_dimensions: false,
        }
    }

    #[must_use]
    pub fn sending_dimensions(mut self) -> Self {
        self.send_dimensions = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: Provider,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Directory holding `model.onnx` and `tokenizer.json` for local models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Token budget per input for local models.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_embedding_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_embedding_model(),
            api_key: None,
            api_base_url: default_api_base_url(),
            model_dir: None,
            timeout_secs: default_embedding_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub default_mode: IngestMode,

    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_show_progress() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_mode: IngestMode::default(),
            show_progress: default_show_progress(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_k() -> usize {
    5
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            default_format: OutputFormat::Text,
        }
    }
}
