//! # faf-core: shared plumbing for the FAF flow toolkit
//!
//! Holds the pieces every other crate leans on:
//!
//! - [`paths`]: locating the repository root independently of the caller's
//!   working directory, and resolving configured paths against it.
//! - [`error`]: [`FafError`], raised when the root cannot be located.
//!
//! ```rust,no_run
//! use faf_core::paths::{resolve_under, top_dir};
//!
//! let root = top_dir()?;
//! let logs = resolve_under(&root, "logs/faf_batch");
//! assert!(logs.starts_with(&root));
//! # Ok::<(), faf_core::FafError>(())
//! ```

pub mod error;
pub mod paths;

pub use error::{FafError, FafResult};
pub use paths::{resolve_under, top_dir, TOP_DIR_ENV};
