//! Repository root discovery.
//!
//! Everything that reads data or writes logs resolves its paths against the
//! repository root, so commands behave the same no matter which directory they
//! are started from.

use crate::error::{FafError, FafResult};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that overrides the compiled-in repository root.
pub const TOP_DIR_ENV: &str = "FAF_TOP_DIR";

/// Depth of this crate's manifest below the repository root (`crates/faf-core`).
const CRATE_DEPTH: usize = 2;

/// Absolute path to the top level of the repository.
///
/// Resolved from this crate's own location, never from the current working
/// directory. `FAF_TOP_DIR` takes precedence when set to a non-empty value.
pub fn top_dir() -> FafResult<PathBuf> {
    if let Some(root) = env::var_os(TOP_DIR_ENV).filter(|v| !v.is_empty()) {
        debug!(root = ?root, "repository root taken from {}", TOP_DIR_ENV);
        return Ok(PathBuf::from(root).canonicalize()?);
    }
    top_dir_from(Path::new(env!("CARGO_MANIFEST_DIR")))
}

/// Walk up from a crate manifest directory to the repository root.
pub fn top_dir_from(manifest_dir: &Path) -> FafResult<PathBuf> {
    let root = manifest_dir
        .ancestors()
        .nth(CRATE_DEPTH)
        .ok_or_else(|| FafError::NoAncestor {
            path: manifest_dir.to_path_buf(),
            levels: CRATE_DEPTH,
        })?;
    Ok(root.canonicalize()?)
}

/// Join `path` onto `root` unless it is already absolute.
pub fn resolve_under(root: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
