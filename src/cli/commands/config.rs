use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(long, short = 'F', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Show the configuration file path")]
    Path,
}

pub fn handle_config(cmd: ConfigCommand, config: &Config, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => handle_init(force, format),
        ConfigCommand::Show => handle_show(config, format),
        ConfigCommand::Path => handle_path(format),
    }
}

fn handle_init(force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let config_path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = Config::default()
        .save()
        .context("failed to write config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}

fn handle_show(config: &Config, format: OutputFormat) -> Result<()> {
    let shown = masked(config);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if let Some(path) = Config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

fn handle_path(format: OutputFormat) -> Result<()> {
    let path =
        Config::config_path().ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({"path": path, "exists": path.exists()})
        ),
        OutputFormat::Text => println!("{}", path.display()),
    }
    Ok(())
}

/// Copy of `config` that is safe to print.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.embedding.api_key.is_some() {
        shown.embedding.api_key = Some(MASK.to_string());
    }
    shown
}
