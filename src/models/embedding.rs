//! Stored embedding records and their string-valued metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::nullable;

/// Metadata key that carries the embedded text alongside the vector.
pub const TEXT_KEY: &str = "text";

/// String-to-string metadata as the store accepts it.
///
/// Arbitrary JSON metadata only becomes `Metadata` through
/// [`Metadata::coerce`], which is where type information is dropped:
///
/// | JSON value | stored as |
/// |---|---|
/// | string | the string itself |
/// | number | its decimal rendering (`3`, `2.5`) |
/// | bool | `true` / `false` |
/// | null | `null` |
/// | array / object | compact JSON text |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert JSON metadata into string metadata.
    pub fn coerce(values: &Map<String, Value>) -> Self {
        Self(
            values
                .iter()
                .map(|(key, value)| (key.clone(), coerce_value(value)))
                .collect(),
        )
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn coerce_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// One stored record: identifier, vector, metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub vector: Vec<f32>,

    #[serde(default, deserialize_with = "nullable")]
    pub metadata: Metadata,
}

impl Embedding {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }

    /// Fresh random identifier (UUIDv4, 122 random bits).
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A similarity query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEmbedding {
    pub id: String,

    #[serde(default, deserialize_with = "nullable")]
    pub vector: Vec<f32>,

    #[serde(default, deserialize_with = "nullable")]
    pub metadata: Metadata,

    #[serde(default, alias = "similarity", skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl ScoredEmbedding {
    /// The embedded text, when it was stored under [`TEXT_KEY`].
    pub fn text(&self) -> Option<&str> {
        self.metadata.get(TEXT_KEY)
    }
}
