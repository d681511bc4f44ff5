use anyhow::Result;
use faf_batch::{load_batch_config, BatchConfig};
use faf_cli::cli::BatchCommands;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod plan;
pub mod run;

pub fn handle(command: &BatchCommands) -> Result<()> {
    match command {
        BatchCommands::Plan { .. } => plan::handle(command),
        BatchCommands::Run { .. } => run::handle(command),
    }
}

/// Built-in FAF5 lists or a TOML file, with command-line overrides applied.
fn resolve_config(
    config: Option<&Path>,
    window: Option<usize>,
    log_dir: Option<&PathBuf>,
) -> Result<BatchConfig> {
    let mut resolved = match config {
        Some(path) => {
            info!("Loading batch config from {}", path.display());
            load_batch_config(path)?
        }
        None => BatchConfig::faf5(),
    };
    if let Some(window) = window {
        resolved.window = window;
    }
    if let Some(log_dir) = log_dir {
        resolved.log_dir = log_dir.clone();
    }
    resolved.validate()?;
    Ok(resolved)
}
