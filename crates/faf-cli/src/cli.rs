use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "faf", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the repository root every relative path is resolved against
    Root,
    /// Shapefile merge and persistence
    Geo {
        #[command(subcommand)]
        command: GeoCommands,
    },
    /// Point-to-point batch driver
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum GeoCommands {
    /// Left join a CSV table onto shapefile geometries and write a new shapefile
    Merge {
        /// CSV table to keep every row of
        #[arg(long)]
        table: PathBuf,
        /// Shapefile providing the geometries
        #[arg(long)]
        shapefile: PathBuf,
        /// Join key column present on both sides
        #[arg(long, default_value = faf_geo::DEFAULT_JOIN_KEY)]
        key: String,
        /// Destination, must end with `.shp`
        #[arg(long)]
        out: PathBuf,
    },
    /// Summarize a shapefile's attributes and geometry
    Inspect {
        #[arg(long)]
        shapefile: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum BatchCommands {
    /// List every job a run would launch, without launching anything
    Plan {
        /// TOML batch config (defaults to the built-in FAF5 lists)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Logical units per window
        #[arg(long)]
        window: Option<usize>,
    },
    /// Launch the point-to-point program for every job
    Run {
        /// TOML batch config (defaults to the built-in FAF5 lists)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Logical units per window
        #[arg(long)]
        window: Option<usize>,
        /// Log directory, relative to the repository root unless absolute
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Exit non-zero when any job fails
        #[arg(long)]
        strict: bool,
    },
}
