pub mod cli;

pub use cli::{BatchCommands, Cli, Commands, GeoCommands};
