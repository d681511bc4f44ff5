//! Shapefile loading into a [`GeoFrame`].
//!
//! dBase attribute records are converted column by column into polars series.
//! Numeric columns whose values are all integral come back as `Int64` so that
//! zone identifiers join cleanly against integer keys read from CSV.

use crate::error::{GeoError, GeoResult};
use crate::frame::GeoFrame;
use polars::prelude::*;
use shapefile::dbase::{self, FieldValue};
use shapefile::{Reader, Shape};
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Load a shapefile with its attribute table and optional `.prj` sidecar.
pub fn read_shapefile(path: impl AsRef<Path>) -> GeoResult<GeoFrame> {
    let path = path.as_ref();
    let dbf = path.with_extension("dbf");
    for required in [path, dbf.as_path()] {
        if File::open(required).is_err() {
            return Err(GeoError::FileNotFound {
                path: required.to_path_buf(),
            });
        }
    }

    let field_names = dbf_field_names(&dbf)?;
    let mut reader = Reader::from_path(path).map_err(|source| GeoError::Shapefile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut geometry: Vec<Option<Shape>> = Vec::new();
    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); field_names.len()];
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|source| GeoError::Shapefile {
            path: path.to_path_buf(),
            source,
        })?;
        geometry.push(match shape {
            Shape::NullShape => None,
            other => Some(other),
        });
        for (column, name) in cells.iter_mut().zip(&field_names) {
            column.push(Cell::from_field(record.get(name)));
        }
    }

    let series: Vec<Series> = field_names
        .iter()
        .zip(cells)
        .map(|(name, column)| column_to_series(name, column))
        .collect();
    let attributes = DataFrame::new(series)?;

    let prj = path.with_extension("prj");
    let projection = if prj.is_file() {
        Some(fs::read_to_string(&prj)?)
    } else {
        None
    };

    debug!(
        path = %path.display(),
        rows = geometry.len(),
        columns = field_names.len(),
        "loaded shapefile"
    );
    GeoFrame::new(attributes, geometry, projection)
}

fn dbf_field_names(dbf: &Path) -> GeoResult<Vec<String>> {
    let reader = dbase::Reader::from_path(dbf).map_err(|source| GeoError::Dbase {
        path: dbf.to_path_buf(),
        source,
    })?;
    Ok(reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect())
}

#[derive(Debug, Clone)]
enum Cell {
    Text(Option<String>),
    Float(Option<f64>),
    Int(Option<i64>),
    Bool(Option<bool>),
}

impl Cell {
    fn from_field(value: Option<&FieldValue>) -> Self {
        let Some(value) = value else {
            return Cell::Text(None);
        };
        match value {
            FieldValue::Character(s) => Cell::Text(s.clone()),
            FieldValue::Memo(s) => Cell::Text(Some(s.clone())),
            FieldValue::Numeric(n) => Cell::Float(*n),
            FieldValue::Float(n) => Cell::Float(n.map(f64::from)),
            FieldValue::Double(n) | FieldValue::Currency(n) => Cell::Float(Some(*n)),
            FieldValue::Integer(n) => Cell::Int(Some(i64::from(*n))),
            FieldValue::Logical(b) => Cell::Bool(*b),
            FieldValue::Date(d) => Cell::Text(
                d.as_ref()
                    .map(|d| format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
            ),
            other => Cell::Text(Some(format!("{other:?}"))),
        }
    }

    fn is_null(&self) -> bool {
        matches!(
            self,
            Cell::Text(None) | Cell::Float(None) | Cell::Int(None) | Cell::Bool(None)
        )
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Float(n) => n.map(|n| n.to_string()),
            Cell::Int(n) => n.map(|n| n.to_string()),
            Cell::Bool(b) => b.map(|b| b.to_string()),
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Cell::Float(n) => *n,
            Cell::Int(n) => n.map(|n| n as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Float,
    Int,
    Bool,
}

fn column_kind(cells: &[Cell]) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells.iter().filter(|cell| !cell.is_null()) {
        let next = match cell {
            Cell::Text(_) => ColumnKind::Text,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Int(_) => ColumnKind::Int,
            Cell::Bool(_) => ColumnKind::Bool,
        };
        kind = Some(match (kind, next) {
            (None, next) => next,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => ColumnKind::Text,
        });
    }
    match kind {
        Some(ColumnKind::Float) if all_integral(cells) => ColumnKind::Int,
        Some(kind) => kind,
        None => ColumnKind::Text,
    }
}

fn all_integral(cells: &[Cell]) -> bool {
    cells
        .iter()
        .filter_map(Cell::as_float)
        .all(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
}

fn column_to_series(name: &str, cells: Vec<Cell>) -> Series {
    match column_kind(&cells) {
        ColumnKind::Text => {
            let values: Vec<Option<String>> = cells.iter().map(Cell::as_text).collect();
            Series::new(name, values)
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = cells.iter().map(Cell::as_float).collect();
            Series::new(name, values)
        }
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| cell.as_float().map(|n| n as i64))
                .collect();
            Series::new(name, values)
        }
        ColumnKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Bool(b) => *b,
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
    }
}
