use crate::config::{BatchConfig, ProgramConfig};
use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// What one launch of the point-to-point program selects, besides the mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum JobTarget {
    Origin(String),
    Destination(String),
    Commodity(String),
}

impl fmt::Display for JobTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTarget::Origin(region) => write!(f, "origin {region}"),
            JobTarget::Destination(region) => write!(f, "destination {region}"),
            JobTarget::Commodity(name) => write!(f, "commodity {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub mode: String,
    pub target: JobTarget,
    /// Zero-based logical unit this job belongs to (a region pair or one commodity)
    pub unit: usize,
    pub log_path: PathBuf,
}

impl Job {
    /// Log file stem, unique within a plan.
    pub fn job_id(&self) -> String {
        self.log_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| log_stem(&self.mode, &self.target))
    }

    /// Full argument list: the program's prefix args, the mode flag, and
    /// exactly one of the origin / destination / commodity flags.
    pub fn args(&self, program: &ProgramConfig) -> Vec<String> {
        let (flag, value) = match &self.target {
            JobTarget::Origin(region) => (&program.origin_flag, region),
            JobTarget::Destination(region) => (&program.dest_flag, region),
            JobTarget::Commodity(name) => (&program.commodity_flag, name),
        };
        let mut args = program.args.clone();
        args.extend([
            program.mode_flag.clone(),
            self.mode.clone(),
            flag.clone(),
            value.clone(),
        ]);
        args
    }
}

/// Replace path-unsafe characters (`/` and space) with underscores.
pub fn sanitize_commodity(name: &str) -> String {
    name.replace(['/', ' '], "_")
}

fn log_stem(mode: &str, target: &JobTarget) -> String {
    match target {
        JobTarget::Origin(region) => format!("{mode}_origin_origin{region}"),
        JobTarget::Destination(region) => format!("{mode}_destination_dest{region}"),
        JobTarget::Commodity(name) => {
            format!("{mode}_origin_commodity_{}", sanitize_commodity(name))
        }
    }
}

/// Log file name for a job, e.g. `truck_destination_dest11.txt`.
pub fn log_file_name(mode: &str, target: &JobTarget) -> String {
    format!("{}.txt", log_stem(mode, target))
}

/// Jobs grouped into logical units, in launch order.
#[derive(Debug, Clone, Default)]
pub struct JobPlan {
    pub units: Vec<Vec<Job>>,
}

impl JobPlan {
    pub fn total_units(&self) -> usize {
        self.units.len()
    }

    pub fn launches(&self) -> usize {
        self.units.iter().map(Vec::len).sum()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.units.iter().flatten()
    }
}

/// Enumerate every job for `config`, logging into `log_dir`.
///
/// Per mode: each region yields an origin job then a destination job (one
/// unit), then each commodity yields one job (one unit). Fails if two jobs
/// would share a log file.
pub fn plan_jobs(config: &BatchConfig, log_dir: &Path) -> Result<JobPlan, BatchError> {
    config.validate()?;
    let mut seen: HashMap<PathBuf, String> = HashMap::new();
    let mut plan = JobPlan {
        units: Vec::with_capacity(config.total_units()),
    };
    for mode in &config.modes {
        let region_units = config.regions.iter().map(|region| {
            vec![
                JobTarget::Origin(region.clone()),
                JobTarget::Destination(region.clone()),
            ]
        });
        let commodity_units = config
            .commodities
            .iter()
            .map(|commodity| vec![JobTarget::Commodity(commodity.clone())]);

        for targets in region_units.chain(commodity_units) {
            let unit = plan.units.len();
            let mut jobs = Vec::with_capacity(targets.len());
            for target in targets {
                let log_path = log_dir.join(log_file_name(mode, &target));
                let label = format!("{mode} {target}");
                if let Some(first) = seen.insert(log_path.clone(), label.clone()) {
                    return Err(BatchError::LogCollision {
                        path: log_path,
                        first,
                        second: label,
                    });
                }
                jobs.push(Job {
                    mode: mode.clone(),
                    target,
                    unit,
                    log_path,
                });
            }
            plan.units.push(jobs);
        }
    }
    Ok(plan)
}
