//! # faf-batch: windowed driver for FAF point-to-point runs
//!
//! Enumerates every (mode × region) and (mode × commodity) combination, launches
//! the external point-to-point analysis once per combination with its output
//! captured in a dedicated log file, and joins each window of launches before
//! starting the next.
//!
//! ```rust,no_run
//! use faf_batch::{execute, BatchConfig};
//! use faf_core::top_dir;
//!
//! let root = top_dir()?;
//! let summary = execute(&BatchConfig::faf5(), &root, |p| {
//!     println!("Processed {} of {}", p.processed, p.total);
//! })?;
//! println!("{} ok / {} failed", summary.success, summary.failure);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod launcher;
pub mod manifest;
pub mod runner;

pub use config::{load_batch_config, BatchConfig, ProgramConfig};
pub use error::BatchError;
pub use job::{log_file_name, plan_jobs, sanitize_commodity, Job, JobPlan, JobTarget};
pub use launcher::{JobHandle, Launcher, ProcessHandle, ProcessLauncher};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest};
pub use runner::{execute, run_batch, BatchSummary, JobResult, Progress};
