use anyhow::Result;
use faf_batch::plan_jobs;
use faf_cli::cli::BatchCommands;
use faf_core::{resolve_under, top_dir};

use super::resolve_config;

/// Handle `faf batch plan`: print every job a run would launch, in launch order.
pub fn handle(command: &BatchCommands) -> Result<()> {
    let BatchCommands::Plan { config, window } = command else {
        unreachable!();
    };
    let config = resolve_config(config.as_deref(), *window, None)?;
    let root = top_dir()?;
    let log_dir = resolve_under(&root, &config.log_dir);
    let plan = plan_jobs(&config, &log_dir)?;

    for job in plan.jobs() {
        println!(
            "{:>5}  {} {}  > {}",
            job.unit + 1,
            config.program.command,
            job.args(&config.program).join(" "),
            job.log_path.display()
        );
    }
    let windows = plan.total_units().div_ceil(config.window);
    println!(
        "Units: {}  Launches: {}  Window: {}  Windows: {}",
        plan.total_units(),
        plan.launches(),
        config.window,
        windows
    );
    Ok(())
}
