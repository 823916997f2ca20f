//! Ingestion modes and their outcome reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ErrorKind, PipelineError};

/// Delivery policy for [`crate::services::IngestionPipeline`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Embed and insert one document at a time; failures are isolated.
    #[default]
    Streaming,
    /// Embed everything, then insert with a single call; all or nothing.
    Batch,
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestMode::Streaming => write!(f, "streaming"),
            IngestMode::Batch => write!(f, "batch"),
        }
    }
}

impl std::str::FromStr for IngestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "streaming" | "stream" => Ok(IngestMode::Streaming),
            "batch" => Ok(IngestMode::Batch),
            _ => Err(format!("unknown ingest mode: {s}")),
        }
    }
}

/// Why a single document did not make it into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ItemFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result for one input document, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub index: usize,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemFailure>,
}

impl ItemOutcome {
    pub fn inserted(index: usize, id: String) -> Self {
        Self {
            index,
            id,
            error: None,
        }
    }

    pub fn failed(index: usize, id: String, err: &PipelineError) -> Self {
        Self {
            index,
            id,
            error: Some(ItemFailure::from(err)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of an ingestion call.
///
/// Batch runs only produce a report on success, so every item in it is
/// inserted; failures surface as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub collection: String,
    pub mode: IngestMode,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
    pub duration_ms: u64,
}

impl IngestionReport {
    pub fn new(collection: impl Into<String>, mode: IngestMode) -> Self {
        Self {
            collection: collection.into(),
            mode,
            succeeded: 0,
            failed: 0,
            items: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.items.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|item| !item.is_success())
    }
}
