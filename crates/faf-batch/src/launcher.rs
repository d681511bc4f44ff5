//! Process launching.
//!
//! The runner only needs "start this job" and "wait for it", so both sit
//! behind traits and tests can drive the windowing without real processes.

use crate::config::ProgramConfig;
use crate::error::BatchError;
use crate::job::Job;
use faf_core::resolve_under;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// A started job that can be joined.
pub trait JobHandle {
    /// Block until the job exits. `None` means it was terminated by a signal.
    fn wait(self) -> io::Result<Option<i32>>;
}

/// Starts jobs without waiting for them.
pub trait Launcher {
    type Handle: JobHandle + Send;

    fn launch(&self, job: &Job) -> io::Result<Self::Handle>;
}

/// Runs the point-to-point program as a child process, one per job.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    config: ProgramConfig,
    working_dir: PathBuf,
}

impl ProcessLauncher {
    /// Resolve the configured command once, before anything is launched.
    ///
    /// Commands containing a path separator are taken relative to `root`;
    /// bare names are looked up on `PATH`.
    pub fn new(config: &ProgramConfig, root: &Path) -> Result<Self, BatchError> {
        let program = resolve_program(&config.command, root)?;
        debug!(program = %program.display(), "resolved point-to-point program");
        Ok(Self {
            program,
            config: config.clone(),
            working_dir: root.to_path_buf(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

fn resolve_program(command: &str, root: &Path) -> Result<PathBuf, BatchError> {
    if command.contains(std::path::MAIN_SEPARATOR) || command.contains('/') {
        let path = resolve_under(root, command);
        if path.is_file() {
            return Ok(path);
        }
    } else if let Ok(path) = which::which(command) {
        return Ok(path);
    }
    Err(BatchError::ProgramNotFound {
        command: command.to_string(),
    })
}

impl Launcher for ProcessLauncher {
    type Handle = ProcessHandle;

    /// Truncates the job's log file and points both stdout and stderr at it.
    fn launch(&self, job: &Job) -> io::Result<ProcessHandle> {
        let log = File::create(&job.log_path)?;
        let stderr = log.try_clone()?;
        let child = Command::new(&self.program)
            .args(job.args(&self.config))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .spawn()?;
        debug!(job = %job.job_id(), pid = child.id(), "launched");
        Ok(ProcessHandle { child })
    }
}

#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
}

impl JobHandle for ProcessHandle {
    fn wait(mut self) -> io::Result<Option<i32>> {
        Ok(self.child.wait()?.code())
    }
}
