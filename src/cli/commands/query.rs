use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::MemVectorClient;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Collection to search
    pub collection: String,

    /// Query text
    pub text: String,

    /// Number of results (defaults to query.default_k)
    #[arg(long, short = 'k')]
    pub k: Option<usize>,
}

pub async fn handle_query(args: QueryArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let client = MemVectorClient::from_config(config).context("failed to initialize client")?;
    let k = args.k.unwrap_or(config.query.default_k);

    let results = client
        .query(&args.collection, &args.text, k)
        .await
        .context("query failed")?;

    print!("{}", formatter.format_query_results(&results));
    Ok(())
}
