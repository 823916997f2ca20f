use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::MemVectorClient;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Target collection
    pub collection: String,

    /// Text to embed
    pub text: String,

    /// Metadata entries (repeatable, format: key=value)
    #[arg(long = "meta", short = 'm', value_parser = parse_key_val)]
    pub metadata: Vec<(String, String)>,
}

pub async fn handle_add(args: AddArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let client =
        MemVectorClient::from_config(config).context("failed to initialize client")?;

    let metadata: Map<String, Value> = args
        .metadata
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let id = client
        .add_text(&args.collection, &args.text, metadata)
        .await?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({"collection": args.collection, "id": id})
        ),
        OutputFormat::Text => print!(
            "{}",
            formatter.format_message(&format!("Inserted {id} into {}", args.collection))
        ),
    }
    Ok(())
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid metadata '{s}', expected key=value"))?;
    if key.trim().is_empty() {
        return Err(format!("invalid metadata '{s}', key is empty"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
