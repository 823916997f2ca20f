use serde::Serialize;
use std::fmt::{self, Write as FmtWrite};

use crate::models::{
    CollectionInfo, Embedding, IngestionReport, ModelSpec, OutputFormat, QueryResults,
};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_collection(&self, info: &CollectionInfo) -> String;
    fn format_embeddings(&self, collection: &str, embeddings: &[Embedding]) -> String;
    fn format_report(&self, report: &IngestionReport) -> String;
    fn format_query_results(&self, results: &QueryResults) -> String;
    fn format_models(&self, models: &[ModelSpec]) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write(&mut output);
    output
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{head}...")
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_collection(&self, info: &CollectionInfo) -> String {
        render(|out| {
            writeln!(out, "Collection: {}", info.name)?;
            writeln!(out, "  Dimension:  {}", info.dimension)?;
            writeln!(out, "  Distance:   {}", info.distance)?;
            writeln!(out, "  Embeddings: {}", info.embedding_count())
        })
    }

    fn format_embeddings(&self, collection: &str, embeddings: &[Embedding]) -> String {
        if embeddings.is_empty() {
            return format!("No embeddings in {collection}.\n");
        }

        render(|out| {
            writeln!(out, "{} embeddings in {collection}\n", embeddings.len())?;
            for embedding in embeddings {
                writeln!(out, "{} ({} dims)", embedding.id, embedding.vector.len())?;
                for (key, value) in embedding.metadata.iter() {
                    writeln!(out, "   {key}: {}", preview(value))?;
                }
            }
            Ok(())
        })
    }

    fn format_report(&self, report: &IngestionReport) -> String {
        render(|out| {
            writeln!(out, "Ingestion Complete ({})", report.mode)?;
            writeln!(out, "------------------")?;
            writeln!(out, "Collection: {}", report.collection)?;
            writeln!(out, "Inserted:   {}", report.succeeded)?;
            writeln!(out, "Failed:     {}", report.failed)?;
            writeln!(out, "Duration:   {}ms", report.duration_ms)?;
            for item in report.failures() {
                if let Some(ref error) = item.error {
                    writeln!(out, "  #{} {}: {}", item.index, item.id, error.message)?;
                }
            }
            Ok(())
        })
    }

    fn format_query_results(&self, results: &QueryResults) -> String {
        if results.is_empty() {
            return match results.query {
                Some(ref query) => format!("No results found for: {query}\n"),
                None => "No results found.\n".to_string(),
            };
        }

        render(|out| {
            if let Some(ref query) = results.query {
                writeln!(out, "Results for: \"{query}\"")?;
            }
            writeln!(out, "Found {} results in {}ms\n", results.len(), results.duration_ms)?;

            for (i, hit) in results.results.iter().enumerate() {
                match hit.score {
                    Some(score) => writeln!(out, "{}. [Score: {score:.3}] {}", i + 1, hit.id)?,
                    None => writeln!(out, "{}. {}", i + 1, hit.id)?,
                }
                if let Some(text) = hit.text() {
                    writeln!(out, "   ---")?;
                    for line in preview(text).lines() {
                        writeln!(out, "   {line}")?;
                    }
                }
                writeln!(out)?;
            }
            Ok(())
        })
    }

    fn format_models(&self, models: &[ModelSpec]) -> String {
        render(|out| {
            writeln!(out, "Embedding Models")?;
            writeln!(out, "----------------")?;
            for spec in models {
                writeln!(out, "  {:<7} {:<32} {}", spec.provider.to_string(), spec.model, spec.dimension)?;
            }
            Ok(())
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("{message}\n")
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {error}\n")
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_collection(&self, info: &CollectionInfo) -> String {
        self.to_json(&serde_json::json!({
            "name": info.name,
            "dimension": info.dimension,
            "distance": info.distance,
            "embedding_count": info.embedding_count(),
        }))
    }

    fn format_embeddings(&self, collection: &str, embeddings: &[Embedding]) -> String {
        self.to_json(&serde_json::json!({
            "collection": collection,
            "embeddings": embeddings,
        }))
    }

    fn format_report(&self, report: &IngestionReport) -> String {
        self.to_json(report)
    }

    fn format_query_results(&self, results: &QueryResults) -> String {
        self.to_json(results)
    }

    fn format_models(&self, models: &[ModelSpec]) -> String {
        self.to_json(&serde_json::json!({"models": models}))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}
