//! Query-related models.

use serde::{Deserialize, Serialize};

use super::embedding::ScoredEmbedding;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Hits for one query, in the order the store ranked them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResults {
    pub collection: String,

    /// Query text, absent for raw vector queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    pub k: usize,

    pub results: Vec<ScoredEmbedding>,

    pub duration_ms: u64,
}

impl QueryResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
