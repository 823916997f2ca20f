//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::cli::output::get_formatter;
use crate::models::{Config, Document, IngestMode, OutputFormat};
use crate::services::MemVectorClient;

/// Arguments for the ingest command.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Target collection
    pub collection: String,

    /// Path to JSON or JSONL file (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    /// Embed everything first, then insert in one all-or-nothing call
    #[arg(long, conflicts_with = "mode")]
    pub batch: bool,

    /// Delivery mode: streaming or batch (defaults to the config)
    #[arg(long)]
    pub mode: Option<IngestMode>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Only validate the input file without ingesting
    #[arg(long)]
    pub validate_only: bool,
}

impl IngestArgs {
    fn resolve_mode(&self, config: &Config) -> IngestMode {
        if self.batch {
            IngestMode::Batch
        } else {
            self.mode.unwrap_or(config.ingest.default_mode)
        }
    }
}

/// Handle the ingest command.
pub async fn handle_ingest(
    args: IngestArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);
    let mode = args.resolve_mode(config);

    let input = read_input(args.file.as_deref())?;
    let documents = parse_documents(&input)?;

    if documents.is_empty() {
        print!("{}", formatter.format_message("No documents found in input."));
        return Ok(());
    }

    if verbose || args.validate_only {
        eprintln!("Found {} documents to ingest", documents.len());
    }

    if args.validate_only {
        print!(
            "{}",
            formatter.format_message(&format!(
                "Validation successful: {} documents ready for ingestion",
                documents.len()
            ))
        );
        return Ok(());
    }

    let show_progress = config.ingest.show_progress && !args.no_progress;
    let client = MemVectorClient::from_config(config)
        .context("failed to initialize client")?
        .with_progress(show_progress);

    let report = client
        .add_documents(&args.collection, documents, mode)
        .await
        .with_context(|| format!("{mode} ingestion into '{}' failed", args.collection))?;

    print!("{}", formatter.format_report(&report));

    if !report.is_complete_success() {
        anyhow::bail!(
            "{} of {} documents were not ingested",
            report.failed,
            report.total()
        );
    }
    Ok(())
}

/// Read input from file or stdin.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path.to_string_lossy() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Parse documents from a JSON array or JSONL.
fn parse_documents(input: &str) -> Result<Vec<Document>> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(Vec::new());
    }

    if input.starts_with('[') {
        return serde_json::from_str(input).context("failed to parse JSON array");
    }

    let mut documents = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(line)
            .with_context(|| format!("failed to parse JSON at line {}", i + 1))?;
        documents.push(doc);
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let docs = parse_documents(
            r#"[{"content": "first", "metadata": {"page": 1}}, {"page_content": "second", "id": "b"}]"#,
        )
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "first");
        assert_eq!(docs[1].id.as_deref(), Some("b"));
    }

    #[test]
    fn test_parse_jsonl_skips_blank_lines() {
        let input = "{\"content\": \"one\"}\n\n{\"content\": \"two\"}\n";
        let docs = parse_documents(input).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].content, "two");
    }

    #[test]
    fn test_parse_jsonl_reports_line_number() {
        let input = "{\"content\": \"one\"}\n{not json}";
        let err = parse_documents(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_documents("   \n").unwrap().is_empty());
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.jsonl");
        std::fs::write(&path, "{\"content\": \"x\"}").unwrap();
        assert_eq!(read_input(Some(path.as_path())).unwrap(), "{\"content\": \"x\"}");
    }

    #[test]
    fn test_batch_flag_overrides_config() {
        let config = Config::default();
        let args = IngestArgs {
            collection: "docs".to_string(),
            file: None,
            batch: true,
            mode: None,
            no_progress: false,
            validate_only: false,
        };
        assert_eq!(args.resolve_mode(&config), IngestMode::Batch);

        let args = IngestArgs { batch: false, ..args };
        assert_eq!(args.resolve_mode(&config), IngestMode::Streaming);
    }
}
