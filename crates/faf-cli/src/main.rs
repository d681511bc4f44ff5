use clap::Parser;
use faf_cli::cli::{Cli, Commands};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install log subscriber: {err}");
    }

    let result = match &cli.command {
        Commands::Root => commands::root::handle(),
        Commands::Geo { command } => commands::geo::handle(command),
        Commands::Batch { command } => commands::batch::handle(command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
