//! Collection metadata as reported by the store.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::embedding::Embedding;
use super::nullable;

/// Similarity function a collection ranks queries with.
///
/// The client only validates the name; the store does the math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Cosine => write!(f, "cosine"),
            Distance::Euclidean => write!(f, "euclidean"),
            Distance::Dot => write!(f, "dot"),
        }
    }
}

impl std::str::FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(Distance::Cosine),
            "euclidean" => Ok(Distance::Euclidean),
            "dot" => Ok(Distance::Dot),
            _ => Err(format!(
                "unknown distance metric: {s} (expected cosine, euclidean or dot)"
            )),
        }
    }
}

/// A collection as returned by `get_collection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Filled in by the client; the store does not echo it back.
    #[serde(default)]
    pub name: String,

    pub dimension: usize,

    pub distance: Distance,

    #[serde(default, deserialize_with = "nullable")]
    pub embeddings: Vec<Embedding>,
}

impl CollectionInfo {
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }
}

/// Dimension and distance of a collection, without its records.
///
/// Deserializing a `get_collection` body into this type skips the
/// `embeddings` array instead of materializing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    #[serde(default)]
    pub name: String,

    pub dimension: usize,

    pub distance: Distance,
}

impl From<CollectionInfo> for CollectionSummary {
    fn from(info: CollectionInfo) -> Self {
        Self {
            name: info.name,
            dimension: info.dimension,
            distance: info.distance,
        }
    }
}
