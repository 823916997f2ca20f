//! Input documents for ingestion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::embedding::{Metadata, TEXT_KEY};

/// Text handed to the ingestion pipeline by an external loader.
///
/// `page_content` is accepted as an alias of `content` so loader exports
/// in the LangChain shape deserialize directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(alias = "page_content")]
    pub content: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata as it will be stored: every value coerced to a string and
    /// `"text"` set to the document content, replacing any existing value.
    pub fn stored_metadata(&self) -> Metadata {
        let mut metadata = Metadata::coerce(&self.metadata);
        metadata.insert(TEXT_KEY, self.content.clone());
        metadata
    }
}
