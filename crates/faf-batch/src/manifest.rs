//! The JSON record left in the log directory after each run.

use crate::runner::JobResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// File name of the manifest written next to the job logs.
pub const MANIFEST_FILE: &str = "batch_manifest.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchManifest {
    pub created_at: DateTime<Utc>,
    /// Command line prefix shared by every job
    pub program: Vec<String>,
    pub window: usize,
    pub total_units: usize,
    pub launches: usize,
    pub success: usize,
    pub failure: usize,
    pub jobs: Vec<JobResult>,
}

/// Serialize `manifest` to `path`; the log directory normally exists already.
pub fn write_batch_manifest(path: &Path, manifest: &BatchManifest) -> Result<()> {
    let describe = || format!("writing batch manifest '{}'", path.display());
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(describe)?;
    }
    let mut out = BufWriter::new(File::create(path).with_context(describe)?);
    serde_json::to_writer_pretty(&mut out, manifest).with_context(describe)?;
    out.write_all(b"\n").with_context(describe)?;
    out.flush().with_context(describe)
}

pub fn load_batch_manifest(path: &Path) -> Result<BatchManifest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading batch manifest '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("batch manifest '{}' is not valid JSON", path.display()))
}
