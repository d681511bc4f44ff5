use anyhow::{bail, Result};
use faf_batch::{execute, BatchSummary};
use faf_cli::cli::BatchCommands;
use faf_core::top_dir;
use std::time::Instant;

use super::resolve_config;

fn print_batch_summary(summary: &BatchSummary, elapsed_secs: f64) {
    println!();
    println!(
        "Batch finished in {:.1}s: {} units, {} launches, {} succeeded, {} failed",
        elapsed_secs, summary.total_units, summary.launches, summary.success, summary.failure
    );
    println!("Manifest: {}", summary.manifest_path.display());

    if summary.failure > 0 {
        println!();
        println!("Failed jobs:");
        for job in summary.jobs.iter().filter(|job| !job.success) {
            println!(
                "  {} - {} (log: {})",
                job.job_id,
                job.error.as_deref().unwrap_or("unknown error"),
                job.log_path.display()
            );
        }
    }
}

/// Handle `faf batch run`.
///
/// Job failures are reported but do not fail the command unless `--strict`.
pub fn handle(command: &BatchCommands) -> Result<()> {
    let BatchCommands::Run {
        config,
        window,
        log_dir,
        strict,
    } = command
    else {
        unreachable!();
    };
    let config = resolve_config(config.as_deref(), *window, log_dir.as_ref())?;
    let root = top_dir()?;

    let start = Instant::now();
    let summary = execute(&config, &root, |progress| {
        println!("Processed {} of {}", progress.processed, progress.total);
    })?;
    print_batch_summary(&summary, start.elapsed().as_secs_f64());

    if *strict && summary.failure > 0 {
        bail!("{} of {} jobs failed", summary.failure, summary.launches);
    }
    Ok(())
}
