//! Command-line interface for `mvdb`.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::{ENV_STORE_URL, OutputFormat};

/// Embed text and manage collections on a MemVectorDB server.
#[derive(Debug, Parser)]
#[command(name = "mvdb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        env = ENV_STORE_URL,
        help = "Store base URL (overrides the config file)"
    )]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create, inspect and delete collections
    #[command(subcommand)]
    Collection(commands::CollectionCommand),

    /// Embed a single text and insert it
    Add(commands::AddArgs),

    /// Ingest documents from a JSON or JSONL file
    Ingest(commands::IngestArgs),

    /// Find the most similar stored texts
    Query(commands::QueryArgs),

    /// List the known embedding models
    Models,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
