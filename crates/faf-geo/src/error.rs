//! Error types for shapefile loading, merging and persistence.

use polars::prelude::PolarsError;
use shapefile::dbase;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a merge a schema problem was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Table,
    Shapefile,
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Table => f.write_str("tabular dataset"),
            JoinSide::Shapefile => f.write_str("shapefile attribute table"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    /// An input file (a shapefile, one of its required companions, or a table) is missing or unreadable.
    #[error("'{}' does not exist or is unreadable", .path.display())]
    FileNotFound { path: PathBuf },

    /// The join key column is absent on one side of a merge.
    #[error("join key '{column}' is missing from the {side}")]
    SchemaMismatch { column: String, side: JoinSide },

    /// The join key exists on both sides but the types cannot be reconciled.
    #[error("join key '{column}' is {left} in the tabular dataset but {right} in the shapefile")]
    KeyType {
        column: String,
        left: String,
        right: String,
    },

    /// Destination does not carry the shapefile suffix; nothing was written.
    #[error(
        "refusing to write '{}': shapefile destinations must end with '{}'",
        .path.display(),
        crate::persist::SHAPEFILE_SUFFIX
    )]
    InvalidExtension { path: PathBuf },

    /// Frame contents cannot be encoded (length mismatch, field names, no geometry).
    #[error("{0}")]
    Invalid(String),

    #[error("shapefile error in '{}': {source}", .path.display())]
    Shapefile {
        path: PathBuf,
        #[source]
        source: shapefile::Error,
    },

    #[error("dBase error in '{}': {source}", .path.display())]
    Dbase {
        path: PathBuf,
        #[source]
        source: dbase::Error,
    },

    /// Moving the staged companion files into place failed; the partial set was removed.
    #[error("committing shapefile '{}': {source}", .path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type GeoResult<T> = Result<T, GeoError>;
