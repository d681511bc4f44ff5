//! # faf-geo: join flow tables to geographic boundaries
//!
//! Tabular FAF results (one row per zone or flow) are combined with zone
//! geometries loaded from a shapefile, then written back out as a shapefile for
//! mapping.
//!
//! ```rust,no_run
//! use faf_geo::{merge, persist, read_table};
//! use std::path::Path;
//!
//! let flows = read_table(Path::new("data/flows_by_zone.csv"))?;
//! let merged = merge(&flows, "data/FAF5_Zones/FAF5_Zones.shp")?;
//! persist(&merged, "outputs/shapefiles/flows_by_zone.shp")?;
//! # Ok::<(), faf_geo::GeoError>(())
//! ```
//!
//! A [`GeoFrame`] keeps attributes in a polars `DataFrame` and geometry in a
//! parallel vector, one entry per row.

pub mod error;
pub mod frame;
pub mod merge;
pub mod persist;
pub mod read;
pub mod table;

pub use error::{GeoError, GeoResult, JoinSide};
pub use frame::GeoFrame;
pub use merge::{merge, merge_frames, merge_on, DEFAULT_JOIN_KEY};
pub use persist::{persist, validate_destination, SHAPEFILE_SUFFIX};
pub use read::read_shapefile;
pub use table::read_table;
