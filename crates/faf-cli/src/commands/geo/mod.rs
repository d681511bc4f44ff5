use anyhow::Result;
use faf_cli::cli::GeoCommands;

pub mod inspect;
pub mod merge;

pub fn handle(command: &GeoCommands) -> Result<()> {
    match command {
        GeoCommands::Merge { .. } => merge::handle(command),
        GeoCommands::Inspect { .. } => inspect::handle(command),
    }
}
