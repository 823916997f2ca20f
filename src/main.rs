use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use memvectordb_client::cli::commands::{
    handle_add, handle_collection, handle_config, handle_ingest, handle_models, handle_query,
};
use memvectordb_client::cli::output::get_formatter;
use memvectordb_client::cli::{Cli, Commands};
use memvectordb_client::models::{Config, OutputFormat};

/// Point `ORT_DYLIB_PATH` at an installed ONNX Runtime when the user has
/// not set one. Must run before any ort code.
fn detect_and_set_ort_path() {
    if std::env::var("ORT_DYLIB_PATH")
        .map(|p| Path::new(&p).exists())
        .unwrap_or(false)
    {
        return;
    }

    let lib_name = if cfg!(target_os = "macos") {
        "libonnxruntime.dylib"
    } else {
        "libonnxruntime.so"
    };

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join("memvectordb-client").join("lib").join(lib_name));
    }
    if cfg!(target_os = "macos") {
        candidates.push("/opt/homebrew/opt/onnxruntime/lib".into());
        candidates.push("/usr/local/opt/onnxruntime/lib".into());
    } else {
        candidates.push("/usr/lib".into());
        candidates.push("/usr/local/lib".into());
        candidates.push("/usr/lib/x86_64-linux-gnu".into());
        candidates.push("/usr/lib/aarch64-linux-gnu".into());
    }

    let found = candidates.into_iter().find_map(|p| {
        let path = if p.ends_with(lib_name) { p } else { p.join(lib_name) };
        path.exists().then_some(path)
    });

    if let Some(path) = found {
        // SAFETY: called at program start before the runtime spawns threads
        // that could read the environment.
        unsafe {
            std::env::set_var("ORT_DYLIB_PATH", path);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "memvectordb_client=debug,mvdb=debug"
    } else {
        "memvectordb_client=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    detect_and_set_ort_path();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("failed to load config")?;
    if let Some(url) = cli.url {
        config.store.url = url;
    }
    let format = cli.format.unwrap_or(config.query.default_format);

    tokio::select! {
        result = run_command(cli.command, &config, format, cli.verbose) => {
            if let Err(e) = result {
                let message = get_formatter(format).format_error(&format!("{e:#}"));
                eprintln!("{}", message.trim_end());
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, stopping.");
        }
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Collection(cmd) => handle_collection(cmd, config, format).await,
        Commands::Add(args) => handle_add(args, config, format).await,
        Commands::Ingest(args) => handle_ingest(args, config, format, verbose).await,
        Commands::Query(args) => handle_query(args, config, format).await,
        Commands::Models => handle_models(config, format),
        Commands::Config(cmd) => handle_config(cmd, config, format),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
