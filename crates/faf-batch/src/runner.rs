use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::job::{plan_jobs, Job, JobPlan, JobTarget};
use crate::launcher::{JobHandle, Launcher, ProcessLauncher};
use crate::manifest::{write_batch_manifest, BatchManifest, MANIFEST_FILE};
use anyhow::{Context, Result};
use chrono::Utc;
use faf_core::resolve_under;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Reported once per logical unit, right after its jobs were launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// Outcome of one launched job. A failed job never stops the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub mode: String,
    pub target: JobTarget,
    pub log_path: PathBuf,
    /// `None` when the process could not be started or was killed by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Returned after a run so callers can report counts and the manifest location.
#[derive(Debug)]
pub struct BatchSummary {
    pub total_units: usize,
    pub launches: usize,
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<JobResult>,
}

struct InFlight<'a, H> {
    job: &'a Job,
    started: Instant,
    handle: io::Result<H>,
}

/// Launch every job in `plan`, joining all outstanding jobs after each
/// `window` logical units and once more at the end.
///
/// Jobs inside a window run concurrently; no job of the next window starts
/// before every job of the previous one has exited. Results come back in
/// launch order.
pub fn run_batch<L, F>(
    plan: &JobPlan,
    window: usize,
    launcher: &L,
    mut on_progress: F,
) -> Result<Vec<JobResult>>
where
    L: Launcher,
    F: FnMut(Progress),
{
    if window == 0 {
        return Err(BatchError::InvalidConfig("window must be at least 1".to_string()).into());
    }
    // Enough waiters for a full window of region units (two jobs each).
    let pool = ThreadPoolBuilder::new()
        .num_threads(window.saturating_mul(2))
        .build()
        .context("building Rayon thread pool for batch waits")?;

    let total = plan.total_units();
    let mut results = Vec::with_capacity(plan.launches());
    let mut in_flight: Vec<InFlight<'_, L::Handle>> = Vec::new();

    for (index, unit) in plan.units.iter().enumerate() {
        for job in unit {
            let started = Instant::now();
            let handle = launcher.launch(job);
            if let Err(err) = &handle {
                warn!(job = %job.job_id(), "launch failed: {err}");
            }
            in_flight.push(InFlight {
                job,
                started,
                handle,
            });
        }

        let processed = index + 1;
        on_progress(Progress { processed, total });
        if processed % window == 0 {
            results.extend(join_all(&pool, std::mem::take(&mut in_flight)));
        }
    }
    results.extend(join_all(&pool, in_flight));
    Ok(results)
}

fn join_all<H>(pool: &ThreadPool, in_flight: Vec<InFlight<'_, H>>) -> Vec<JobResult>
where
    H: JobHandle + Send,
{
    if in_flight.is_empty() {
        return Vec::new();
    }
    // one task per job, so a short job is never queued behind a long one
    let mut results: Vec<Option<JobResult>> = Vec::new();
    results.resize_with(in_flight.len(), || None);
    pool.scope(|scope| {
        for (slot, entry) in results.iter_mut().zip(in_flight) {
            scope.spawn(move |_| *slot = Some(finish(entry)));
        }
    });
    results.into_iter().flatten().collect()
}

fn finish<H: JobHandle>(entry: InFlight<'_, H>) -> JobResult {
    let InFlight {
        job,
        started,
        handle,
    } = entry;
    let (exit_code, error) = match handle {
        Err(err) => (None, Some(format!("failed to launch: {err}"))),
        Ok(handle) => match handle.wait() {
            Ok(Some(0)) => (Some(0), None),
            Ok(Some(code)) => (Some(code), Some(format!("exited with status {code}"))),
            Ok(None) => (None, Some("terminated by signal".to_string())),
            Err(err) => (None, Some(format!("waiting for process failed: {err}"))),
        },
    };
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if let Some(err) = &error {
        warn!(job = %job.job_id(), log = %job.log_path.display(), "job failed: {err}");
    }
    JobResult {
        job_id: job.job_id(),
        mode: job.mode.clone(),
        target: job.target.clone(),
        log_path: job.log_path.clone(),
        exit_code,
        success: error.is_none(),
        error,
        duration_ms,
    }
}

/// Plan, launch and record a whole batch rooted at `root`.
///
/// Configuration, planning and program lookup errors abort before any job
/// starts. Job failures are only counted; the manifest lands in the log
/// directory as `batch_manifest.json`.
pub fn execute<F>(config: &BatchConfig, root: &Path, on_progress: F) -> Result<BatchSummary>
where
    F: FnMut(Progress),
{
    config.validate()?;
    let log_dir = resolve_under(root, &config.log_dir);
    let plan = plan_jobs(config, &log_dir)?;
    let launcher = ProcessLauncher::new(&config.program, root)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory '{}'", log_dir.display()))?;

    info!(
        units = plan.total_units(),
        launches = plan.launches(),
        window = config.window,
        log_dir = %log_dir.display(),
        "starting batch"
    );
    let jobs = run_batch(&plan, config.window, &launcher, on_progress)?;
    let success = jobs.iter().filter(|job| job.success).count();
    let failure = jobs.len() - success;

    let mut program = vec![launcher.program().display().to_string()];
    program.extend(config.program.args.iter().cloned());
    let manifest = BatchManifest {
        created_at: Utc::now(),
        program,
        window: config.window,
        total_units: plan.total_units(),
        launches: plan.launches(),
        success,
        failure,
        jobs: jobs.clone(),
    };
    let manifest_path = log_dir.join(MANIFEST_FILE);
    write_batch_manifest(&manifest_path, &manifest)?;
    info!(success, failure, manifest = %manifest_path.display(), "batch finished");

    Ok(BatchSummary {
        total_units: plan.total_units(),
        launches: plan.launches(),
        success,
        failure,
        manifest_path,
        jobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Launch(String),
        Exit(String),
    }

    #[derive(Default)]
    struct FakeLauncher {
        events: Arc<Mutex<Vec<Event>>>,
        refuse: HashSet<String>,
        exit_codes: HashMap<String, i32>,
        run_times: HashMap<String, Duration>,
    }

    struct FakeHandle {
        id: String,
        code: i32,
        run_time: Duration,
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl JobHandle for FakeHandle {
        fn wait(self) -> io::Result<Option<i32>> {
            thread::sleep(self.run_time);
            self.events.lock().unwrap().push(Event::Exit(self.id));
            Ok(Some(self.code))
        }
    }

    impl Launcher for FakeLauncher {
        type Handle = FakeHandle;

        fn launch(&self, job: &Job) -> io::Result<FakeHandle> {
            let id = job.job_id();
            if self.refuse.contains(&id) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "refused"));
            }
            self.events.lock().unwrap().push(Event::Launch(id.clone()));
            Ok(FakeHandle {
                code: self.exit_codes.get(&id).copied().unwrap_or(0),
                run_time: self.run_times.get(&id).copied().unwrap_or_default(),
                id,
                events: Arc::clone(&self.events),
            })
        }
    }

    fn plan(regions: usize, commodities: usize) -> JobPlan {
        let config = BatchConfig {
            modes: vec!["truck".into()],
            regions: (0..regions).map(|r| format!("{}", 11 + r)).collect(),
            commodities: (0..commodities).map(|c| format!("c{c}")).collect(),
            ..BatchConfig::default()
        };
        plan_jobs(&config, Path::new("logs")).unwrap()
    }

    #[test]
    fn windows_are_joined_before_the_next_launch() {
        let plan = plan(5, 6);
        let launcher = FakeLauncher::default();
        let window = 4;
        let results = run_batch(&plan, window, &launcher, |_| {}).unwrap();
        assert_eq!(results.len(), plan.launches());

        let events = launcher.events.lock().unwrap().clone();
        let position = |event: &Event| events.iter().position(|e| e == event).unwrap();
        for job in plan.jobs() {
            let launched = position(&Event::Launch(job.job_id()));
            let barrier = (job.unit / window) * window;
            for earlier in plan.jobs().filter(|other| other.unit < barrier) {
                assert!(
                    position(&Event::Exit(earlier.job_id())) < launched,
                    "{} launched before {} exited",
                    job.job_id(),
                    earlier.job_id()
                );
            }
        }
    }

    #[test]
    fn progress_counts_units_not_launches() {
        let plan = plan(2, 1);
        let mut seen = Vec::new();
        run_batch(&plan, 8, &FakeLauncher::default(), |p| seen.push(p)).unwrap();
        assert_eq!(
            seen,
            vec![
                Progress { processed: 1, total: 3 },
                Progress { processed: 2, total: 3 },
                Progress { processed: 3, total: 3 },
            ]
        );
    }

    #[test]
    fn failures_are_recorded_and_do_not_stop_the_batch() {
        let plan = plan(2, 2);
        let launcher = FakeLauncher {
            refuse: HashSet::from(["truck_destination_dest11".to_string()]),
            exit_codes: HashMap::from([("truck_origin_commodity_c1".to_string(), 2)]),
            ..FakeLauncher::default()
        };
        let results = run_batch(&plan, 1, &launcher, |_| {}).unwrap();
        assert_eq!(results.len(), 6);

        let ids: Vec<&str> = results.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids[0], "truck_origin_origin11");
        assert_eq!(ids[5], "truck_origin_commodity_c1");

        let refused = &results[1];
        assert!(!refused.success);
        assert_eq!(refused.exit_code, None);
        assert!(refused.error.as_deref().unwrap().contains("failed to launch"));

        let nonzero = &results[5];
        assert!(!nonzero.success);
        assert_eq!(nonzero.exit_code, Some(2));
        assert_eq!(results.iter().filter(|r| r.success).count(), 4);
    }

    #[test]
    fn each_duration_ends_at_its_own_exit() {
        let plan = plan(1, 2);
        let slow = "truck_origin_commodity_c1".to_string();
        let mut run_times: HashMap<String, Duration> = plan
            .jobs()
            .map(|job| (job.job_id(), Duration::from_millis(10)))
            .collect();
        run_times.insert(slow.clone(), Duration::from_millis(400));
        let launcher = FakeLauncher {
            run_times,
            ..FakeLauncher::default()
        };

        let results = run_batch(&plan, 8, &launcher, |_| {}).unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[3].job_id, slow);
        for result in &results {
            if result.job_id == slow {
                assert!(result.duration_ms >= 400);
            } else {
                assert!(
                    result.duration_ms < 300,
                    "{} took {}ms",
                    result.job_id,
                    result.duration_ms
                );
            }
        }
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = run_batch(&plan(1, 0), 0, &FakeLauncher::default(), |_| {}).unwrap_err();
        assert!(err.downcast_ref::<BatchError>().is_some());
    }

    #[test]
    fn missing_program_fails_before_any_log_is_created() {
        let root = tempfile::tempdir().unwrap();
        let config = BatchConfig {
            modes: vec!["truck".into()],
            regions: vec!["all".into()],
            commodities: vec![],
            program: crate::ProgramConfig {
                command: "bin/missing".into(),
                ..Default::default()
            },
            ..BatchConfig::default()
        };
        let err = execute(&config, root.path(), |_| {}).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BatchError>(),
            Some(BatchError::ProgramNotFound { .. })
        ));
        assert!(!root.path().join("logs").exists());
    }

    #[cfg(unix)]
    #[test]
    fn execute_runs_real_processes_and_writes_manifest() {
        use crate::manifest::load_batch_manifest;

        let root = tempfile::tempdir().unwrap();
        let config = BatchConfig {
            window: 2,
            log_dir: PathBuf::from("logs/run"),
            modes: vec!["truck".into()],
            regions: vec!["all".into(), "11".into()],
            commodities: vec!["Live animals/fish".into()],
            program: crate::ProgramConfig {
                command: "sh".into(),
                args: vec![
                    "-c".into(),
                    "echo \"$*\"; case \"$*\" in *fish*) exit 4;; esac".into(),
                    "p2p".into(),
                ],
                ..Default::default()
            },
        };
        let mut progress = Vec::new();
        let summary = execute(&config, root.path(), |p| progress.push(p.processed)).unwrap();

        assert_eq!(progress, vec![1, 2, 3]);
        assert_eq!(summary.total_units, 3);
        assert_eq!(summary.launches, 5);
        assert_eq!(summary.success, 4);
        assert_eq!(summary.failure, 1);

        let log_dir = root.path().join("logs/run");
        let log =
            fs::read_to_string(log_dir.join("truck_origin_commodity_Live_animals_fish.txt"))
                .unwrap();
        assert_eq!(log.trim(), "-m truck -c Live animals/fish");
        assert!(log_dir.join("truck_destination_dest11.txt").exists());

        let manifest = load_batch_manifest(&summary.manifest_path).unwrap();
        assert_eq!(summary.manifest_path, log_dir.join(MANIFEST_FILE));
        assert_eq!(manifest.failure, 1);
        assert_eq!(manifest.jobs.len(), 5);
        assert_eq!(manifest.jobs[4].exit_code, Some(4));
    }
}
