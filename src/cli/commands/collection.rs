use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, Distance, OutputFormat};
use crate::services::{MemVectorClient, StoreClient, VectorStore};

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    #[command(about = "Create a collection sized for the configured model")]
    Create {
        name: String,
        #[arg(long, short = 'd', default_value_t = Distance::Cosine, help = "cosine, euclidean or dot")]
        distance: Distance,
        #[arg(long, help = "Explicit dimension instead of the model's")]
        dimension: Option<usize>,
    },
    #[command(about = "Show a collection's dimension, distance and size")]
    Get { name: String },
    #[command(about = "Delete a collection and everything in it")]
    Delete { name: String },
    #[command(about = "List the embeddings stored in a collection")]
    Embeddings { name: String },
}

pub async fn handle_collection(
    cmd: CollectionCommand,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let formatter = get_formatter(format);
    let store = StoreClient::new(&config.store, config.retry.clone())
        .context("failed to create store client")?;

    match cmd {
        CollectionCommand::Create {
            name,
            distance,
            dimension,
        } => {
            let status = match dimension {
                Some(dimension) => store.create_collection(&name, dimension, distance).await?,
                None => {
                    let client = MemVectorClient::from_config(config)
                        .context("failed to initialize embedding model")?;
                    client.create_collection(&name, distance).await?
                }
            };
            println!("{}", formatter.format_message(&status).trim_end());
        }
        CollectionCommand::Get { name } => {
            let info = store.get_collection(&name).await?;
            print!("{}", formatter.format_collection(&info));
        }
        CollectionCommand::Delete { name } => {
            let status = store.delete_collection(&name).await?;
            println!("{}", formatter.format_message(&status).trim_end());
        }
        CollectionCommand::Embeddings { name } => {
            let embeddings = store.list_embeddings(&name).await?;
            print!("{}", formatter.format_embeddings(&name, &embeddings));
        }
    }

    Ok(())
}
