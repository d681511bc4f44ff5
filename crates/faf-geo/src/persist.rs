//! Writing a [`GeoFrame`] out as a shapefile.
//!
//! The companion files are written into a staging directory beside the
//! destination and moved into place together, so readers never observe a
//! `.shp` without its matching `.shx`/`.dbf`.

use crate::error::{GeoError, GeoResult};
use crate::frame::GeoFrame;
use polars::prelude::*;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Shape, Writer};
use std::collections::HashSet;
use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SHAPEFILE_SUFFIX: &str = ".shp";

/// Every sidecar that belongs to one logical shapefile.
const COMPANIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];
const REQUIRED_COMPANIONS: [&str; 3] = ["shp", "shx", "dbf"];

/// dBase field names are limited to 10 bytes.
const MAX_FIELD_NAME: usize = 10;
const MAX_CHARACTER_WIDTH: usize = 254;
/// The dBase writer crops numeric text at the field width, so nothing wider is accepted.
const MAX_NUMERIC_WIDTH: usize = 254;
/// Numeric values are read back through `f64`; larger integers would not survive.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Reject destinations that do not end with the literal `.shp` suffix.
pub fn validate_destination(path: &Path) -> GeoResult<()> {
    if path.as_os_str().to_string_lossy().ends_with(SHAPEFILE_SUFFIX) {
        Ok(())
    } else {
        Err(GeoError::InvalidExtension {
            path: path.to_path_buf(),
        })
    }
}

/// Persist `frame` to `path`, creating the parent directory when missing.
///
/// Rows without geometry cannot be encoded and are skipped with a warning.
pub fn persist(frame: &GeoFrame, path: impl AsRef<Path>) -> GeoResult<()> {
    let path = path.as_ref();
    validate_destination(path)?;
    if frame.geometry_count() == 0 {
        return Err(GeoError::Invalid(format!(
            "nothing to write to '{}': no rows carry geometry",
            path.display()
        )));
    }
    let fields = encode_fields(&frame.attributes)?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| GeoError::Invalid(format!("'{}' has no file name", path.display())))?;

    let stage = tempfile::Builder::new()
        .prefix(".faf-stage-")
        .tempdir_in(&parent)?;
    let staged = stage.path().join(file_name);
    let skipped = write_staged(frame, &fields, &staged)?;
    if let Some(projection) = &frame.projection {
        fs::write(staged.with_extension("prj"), projection)?;
    }
    commit(&staged, path)?;

    if skipped > 0 {
        warn!(
            path = %path.display(),
            skipped,
            "rows without geometry were not written"
        );
    }
    info!(
        path = %path.display(),
        rows = frame.height() - skipped,
        "wrote shapefile"
    );
    Ok(())
}

/// One dBase column: its field definition plus the encoded value of every row.
struct EncodedField {
    name: String,
    kind: FieldKind,
    values: Vec<FieldValue>,
}

enum FieldKind {
    Character(u8),
    Numeric { width: u8, decimals: u8 },
    Logical,
}

impl EncodedField {
    fn add_to(&self, builder: TableWriterBuilder) -> GeoResult<TableWriterBuilder> {
        let name = FieldName::try_from(self.name.as_str()).map_err(|err| {
            GeoError::Invalid(format!("invalid dBase field name '{}': {err:?}", self.name))
        })?;
        Ok(match self.kind {
            FieldKind::Character(width) => builder.add_character_field(name, width),
            FieldKind::Numeric { width, decimals } => {
                builder.add_numeric_field(name, width, decimals)
            }
            FieldKind::Logical => builder.add_logical_field(name),
        })
    }
}

fn encode_fields(attributes: &DataFrame) -> GeoResult<Vec<EncodedField>> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(attributes.width());
    for series in attributes.get_columns() {
        let name = unique_field_name(series.name(), &seen)?;
        if name != series.name() {
            warn!(column = series.name(), field = %name, "renamed column for dBase");
        }
        seen.insert(name.clone());
        fields.push(encode_series(name, series)?);
    }
    Ok(fields)
}

/// Truncate to 10 bytes; on a clash, replace the tail with `_1`, `_2`, ...
fn unique_field_name(column: &str, seen: &HashSet<String>) -> GeoResult<String> {
    let name = field_name(column);
    if !seen.contains(&name) {
        return Ok(name);
    }
    (1..=seen.len())
        .map(|n| {
            let tail = format!("_{n}");
            format!("{}{tail}", truncate(column, MAX_FIELD_NAME - tail.len()))
        })
        .find(|candidate| !seen.contains(candidate))
        .ok_or_else(|| {
            GeoError::Invalid(format!("no free dBase field name for column '{column}'"))
        })
}

fn field_name(column: &str) -> String {
    truncate(column, MAX_FIELD_NAME).to_string()
}

fn truncate(value: &str, max_bytes: usize) -> &str {
    let mut end = value.len().min(max_bytes);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

fn encode_series(name: String, series: &Series) -> GeoResult<EncodedField> {
    let field = match series.dtype() {
        DataType::Boolean => EncodedField {
            name,
            kind: FieldKind::Logical,
            values: series
                .bool()?
                .into_iter()
                .map(FieldValue::Logical)
                .collect(),
        },
        dtype if dtype.is_float() => encode_reals(name, series)?,
        dtype if dtype.is_numeric() => encode_integers(name, series)?,
        _ => {
            let text = series.cast(&DataType::Utf8)?;
            let text = text.utf8()?;
            if text
                .into_iter()
                .flatten()
                .any(|value| value.len() > MAX_CHARACTER_WIDTH)
            {
                warn!(field = %name, "truncating values longer than {} bytes", MAX_CHARACTER_WIDTH);
            }
            let values: Vec<Option<String>> = text
                .into_iter()
                .map(|value| value.map(|v| truncate(v, MAX_CHARACTER_WIDTH).to_string()))
                .collect();
            let width = values
                .iter()
                .flatten()
                .map(String::len)
                .max()
                .unwrap_or(1)
                .max(1);
            EncodedField {
                name,
                kind: FieldKind::Character(width as u8),
                values: values.into_iter().map(FieldValue::Character).collect(),
            }
        }
    };
    Ok(field)
}

fn encode_integers(name: String, series: &Series) -> GeoResult<EncodedField> {
    let not_exact = |value: String| {
        GeoError::Invalid(format!(
            "value {value} in column '{}' cannot be stored exactly in a dBase numeric field",
            series.name()
        ))
    };
    // u64 values above i64::MAX fail here instead of turning into nulls
    let integers = series
        .strict_cast(&DataType::Int64)
        .map_err(|_| not_exact(format!("of type {}", series.dtype())))?;

    let mut width = 1;
    let mut values = Vec::with_capacity(integers.len());
    for value in integers.i64()?.into_iter() {
        match value {
            Some(v) if v.unsigned_abs() > MAX_EXACT_INTEGER => return Err(not_exact(v.to_string())),
            Some(v) => {
                width = width.max(v.to_string().len());
                values.push(FieldValue::Numeric(Some(v as f64)));
            }
            None => values.push(FieldValue::Numeric(None)),
        }
    }
    Ok(EncodedField {
        name,
        kind: FieldKind::Numeric {
            width: width as u8,
            decimals: 0,
        },
        values,
    })
}

/// Decimals are the fewest that reproduce every value exactly; the width is the
/// longest rendering at that precision.
fn encode_reals(name: String, series: &Series) -> GeoResult<EncodedField> {
    let reals = series.cast(&DataType::Float64)?;
    let reals = reals.f64()?;
    let too_wide = |value: f64| {
        GeoError::Invalid(format!(
            "value {value:e} in column '{}' does not fit a dBase numeric field",
            series.name()
        ))
    };

    let mut decimals = 0;
    for value in reals.into_iter().flatten() {
        if !value.is_finite() {
            return Err(GeoError::Invalid(format!(
                "column '{}' holds {value}, which dBase numeric fields cannot represent",
                series.name()
            )));
        }
        decimals = decimals.max(round_trip_decimals(value).ok_or_else(|| too_wide(value))?);
    }

    let mut width = if decimals > 0 { decimals + 2 } else { 1 };
    for value in reals.into_iter().flatten() {
        let rendered = format!("{value:.decimals$}").len();
        if rendered > MAX_NUMERIC_WIDTH {
            return Err(too_wide(value));
        }
        width = width.max(rendered);
    }
    Ok(EncodedField {
        name,
        kind: FieldKind::Numeric {
            width: width as u8,
            decimals: decimals as u8,
        },
        values: reals.into_iter().map(FieldValue::Numeric).collect(),
    })
}

fn round_trip_decimals(value: f64) -> Option<usize> {
    (0..=MAX_NUMERIC_WIDTH - 2).find(|&decimals| {
        let rendered = format!("{value:.decimals$}");
        rendered.len() <= MAX_NUMERIC_WIDTH && rendered.parse::<f64>().ok() == Some(value)
    })
}

/// Write shapes and records into the staging location; returns rows skipped.
fn write_staged(frame: &GeoFrame, fields: &[EncodedField], staged: &Path) -> GeoResult<usize> {
    let shapefile_err = |source| GeoError::Shapefile {
        path: staged.to_path_buf(),
        source,
    };
    let mut builder = TableWriterBuilder::new();
    for field in fields {
        builder = field.add_to(builder)?;
    }
    let mut writer = Writer::from_path(staged, builder).map_err(shapefile_err)?;

    let mut skipped = 0;
    for (row, shape) in frame.geometry.iter().enumerate() {
        let shape = match shape {
            None | Some(Shape::NullShape) => {
                skipped += 1;
                continue;
            }
            Some(shape) => shape,
        };
        let mut record = Record::default();
        for field in fields {
            record.insert(field.name.clone(), field.values[row].clone());
        }
        write_shape(&mut writer, shape, &record).map_err(shapefile_err)?;
    }
    // headers and the index are finalized on drop
    drop(writer);
    debug!(staged = %staged.display(), skipped, "staged shapefile");
    Ok(skipped)
}

fn write_shape<W: Write + Seek>(
    writer: &mut Writer<W>,
    shape: &Shape,
    record: &Record,
) -> Result<(), shapefile::Error> {
    match shape {
        Shape::Point(s) => writer.write_shape_and_record(s, record),
        Shape::PointM(s) => writer.write_shape_and_record(s, record),
        Shape::PointZ(s) => writer.write_shape_and_record(s, record),
        Shape::Polyline(s) => writer.write_shape_and_record(s, record),
        Shape::PolylineM(s) => writer.write_shape_and_record(s, record),
        Shape::PolylineZ(s) => writer.write_shape_and_record(s, record),
        Shape::Polygon(s) => writer.write_shape_and_record(s, record),
        Shape::PolygonM(s) => writer.write_shape_and_record(s, record),
        Shape::PolygonZ(s) => writer.write_shape_and_record(s, record),
        Shape::Multipoint(s) => writer.write_shape_and_record(s, record),
        Shape::MultipointM(s) => writer.write_shape_and_record(s, record),
        Shape::MultipointZ(s) => writer.write_shape_and_record(s, record),
        Shape::Multipatch(s) => writer.write_shape_and_record(s, record),
        Shape::NullShape => Ok(()),
    }
}

/// Move the staged companion set onto `dest`, removing stale sidecars.
fn commit(staged: &Path, dest: &Path) -> GeoResult<()> {
    for ext in REQUIRED_COMPANIONS {
        if !staged.with_extension(ext).is_file() {
            return Err(GeoError::Invalid(format!(
                "incomplete shapefile for '{}': .{ext} was not produced",
                dest.display()
            )));
        }
    }

    let mut moved: Vec<PathBuf> = Vec::new();
    for ext in COMPANIONS {
        let from = staged.with_extension(ext);
        let to = dest.with_extension(ext);
        let result = if from.is_file() {
            fs::rename(&from, &to).map(|_| moved.push(to.clone()))
        } else if to.is_file() {
            fs::remove_file(&to)
        } else {
            Ok(())
        };
        if let Err(source) = result {
            for path in &moved {
                let _ = fs::remove_file(path);
            }
            return Err(GeoError::Commit {
                path: dest.to_path_buf(),
                source,
            });
        }
    }
    Ok(())
}
