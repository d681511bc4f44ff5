use std::path::PathBuf;
use thiserror::Error;

/// Planning and setup failures that stop a batch before anything is launched.
///
/// Individual job failures are never errors; they are reported on
/// [`JobResult`](crate::JobResult).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch configuration: {0}")]
    InvalidConfig(String),

    /// Two jobs would write the same log file.
    #[error("jobs '{first}' and '{second}' would both log to '{}'", .path.display())]
    LogCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("point-to-point program '{command}' was not found")]
    ProgramNotFound { command: String },
}
