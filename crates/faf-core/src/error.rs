//! Errors raised while locating the repository root.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FafError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The crate manifest sits too close to the filesystem root.
    #[error("'{}' has no ancestor {levels} levels up", .path.display())]
    NoAncestor { path: PathBuf, levels: usize },
}

pub type FafResult<T> = Result<T, FafError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ancestor_names_path_and_depth() {
        let err = FafError::NoAncestor {
            path: PathBuf::from("/"),
            levels: 2,
        };
        assert_eq!(err.to_string(), "'/' has no ancestor 2 levels up");
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open() -> FafResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(FafError::Io(_))));
    }
}
