use anyhow::Result;

use crate::cli::output::get_formatter;
use crate::models::{Config, ModelSpec, OutputFormat};
use crate::services::ModelTable;

pub fn handle_models(config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let models: Vec<ModelSpec> = ModelTable::from_config(config).iter().cloned().collect();
    print!("{}", formatter.format_models(&models));
    Ok(())
}
