//! Left join of a tabular dataset onto shapefile geometries.

use crate::error::{GeoError, GeoResult, JoinSide};
use crate::frame::{clone_shape, GeoFrame};
use crate::read::read_shapefile;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Join key shared by FAF5 zone tables and the FAF5 zone shapefile.
pub const DEFAULT_JOIN_KEY: &str = "FAF_Zone";

/// Scratch column carrying each shapefile row's position through the join.
const GEOMETRY_ROW: &str = "__faf_geometry_row";

/// Merge `table` with the shapefile at `shapefile` on [`DEFAULT_JOIN_KEY`].
pub fn merge(table: &DataFrame, shapefile: impl AsRef<Path>) -> GeoResult<GeoFrame> {
    merge_on(table, shapefile, DEFAULT_JOIN_KEY)
}

/// Merge `table` with the shapefile at `shapefile` on an explicit key column.
pub fn merge_on(table: &DataFrame, shapefile: impl AsRef<Path>, key: &str) -> GeoResult<GeoFrame> {
    let path = shapefile.as_ref();
    let geo = read_shapefile(path)?;
    let merged = merge_frames(table, &geo, key)?;
    info!(
        shapefile = %path.display(),
        key,
        rows = merged.height(),
        matched = merged.geometry_count(),
        "merged table with shapefile"
    );
    Ok(merged)
}

/// Left join `table` against an already loaded [`GeoFrame`].
///
/// Every row of `table` is kept in order. Rows whose key has no match get null
/// attributes and `None` geometry; keys repeated in `geo` fan out.
pub fn merge_frames(table: &DataFrame, geo: &GeoFrame, key: &str) -> GeoResult<GeoFrame> {
    require_column(table, key, JoinSide::Table)?;
    require_column(&geo.attributes, key, JoinSide::Shapefile)?;

    let mut right = geo.attributes.with_row_count(GEOMETRY_ROW, None)?;
    let left_dtype = table.column(key)?.dtype().clone();
    let right_dtype = right.column(key)?.dtype().clone();
    if left_dtype != right_dtype {
        debug!(key, from = %right_dtype, to = %left_dtype, "casting shapefile join key");
        let cast = right
            .column(key)?
            .strict_cast(&left_dtype)
            .map_err(|_| GeoError::KeyType {
                column: key.to_string(),
                left: left_dtype.to_string(),
                right: right_dtype.to_string(),
            })?;
        right.with_column(cast)?;
    }

    let joined = table
        .clone()
        .lazy()
        .left_join(right.lazy(), col(key), col(key))
        .collect()?;

    let geometry = joined
        .column(GEOMETRY_ROW)?
        .idx()?
        .into_iter()
        .map(|row| {
            row.and_then(|row| geo.geometry.get(row as usize)?.as_ref().map(clone_shape))
        })
        .collect();
    let attributes = joined.drop(GEOMETRY_ROW)?;
    GeoFrame::new(attributes, geometry, geo.projection.clone())
}

fn require_column(frame: &DataFrame, key: &str, side: JoinSide) -> GeoResult<()> {
    if frame.get_column_names().contains(&key) {
        Ok(())
    } else {
        Err(GeoError::SchemaMismatch {
            column: key.to_string(),
            side,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::shape_kind;
    use crate::persist::persist;
    use shapefile::{Point, Shape};
    use tempfile::tempdir;

    fn zones() -> GeoFrame {
        let attributes = df!(
            "FAF_Zone" => &[11i64, 12, 19],
            "name" => &["Birmingham", "Mobile", "Rest of AL"]
        )
        .unwrap();
        GeoFrame::new(
            attributes,
            vec![
                Some(Shape::Point(Point::new(-86.8, 33.5))),
                Some(Shape::Point(Point::new(-88.0, 30.7))),
                Some(Shape::Point(Point::new(-86.9, 32.3))),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn left_join_preserves_rows_for_unique_right_key() {
        let table = df!(
            "FAF_Zone" => &[19i64, 11, 99, 12],
            "tons" => &[1.5, 2.5, 3.5, 4.5]
        )
        .unwrap();
        let merged = merge_frames(&table, &zones(), DEFAULT_JOIN_KEY).unwrap();

        assert_eq!(merged.height(), table.height());
        assert_eq!(merged.geometry_count(), 3);
        let keys: Vec<Option<i64>> = merged
            .attributes
            .column("FAF_Zone")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(keys, vec![Some(19), Some(11), Some(99), Some(12)]);

        // zone 99 has no boundary
        assert!(merged.geometry[2].is_none());
        let names = merged.attributes.column("name").unwrap();
        assert_eq!(names.null_count(), 1);
        match &merged.geometry[1] {
            Some(Shape::Point(p)) => assert_eq!((p.x, p.y), (-86.8, 33.5)),
            other => panic!("unexpected geometry {:?}", other.as_ref().map(shape_kind)),
        }
    }

    #[test]
    fn duplicate_right_keys_fan_out() {
        let mut geo = zones();
        geo.attributes = df!(
            "FAF_Zone" => &[11i64, 11, 19],
            "name" => &["a", "b", "c"]
        )
        .unwrap();
        let table = df!("FAF_Zone" => &[11i64, 19]).unwrap();
        let merged = merge_frames(&table, &geo, DEFAULT_JOIN_KEY).unwrap();
        assert_eq!(merged.height(), 3);
        assert_eq!(merged.geometry_count(), 3);
    }

    #[test]
    fn missing_key_in_table_is_schema_mismatch() {
        let table = df!("zone" => &[11i64]).unwrap();
        let err = merge_frames(&table, &zones(), DEFAULT_JOIN_KEY).unwrap_err();
        assert!(matches!(
            err,
            GeoError::SchemaMismatch {
                side: JoinSide::Table,
                ..
            }
        ));
    }

    #[test]
    fn missing_key_in_shapefile_is_schema_mismatch() {
        let table = df!("FAF_Zone" => &[11i64], "zone" => &[11i64]).unwrap();
        let err = merge_frames(&table, &zones(), "zone").unwrap_err();
        assert!(matches!(
            err,
            GeoError::SchemaMismatch {
                side: JoinSide::Shapefile,
                ..
            }
        ));
    }

    #[test]
    fn string_keys_are_cast_to_table_dtype() {
        let mut geo = zones();
        geo.attributes = df!(
            "FAF_Zone" => &["11", "12", "19"],
            "name" => &["a", "b", "c"]
        )
        .unwrap();
        let table = df!("FAF_Zone" => &[12i64]).unwrap();
        let merged = merge_frames(&table, &geo, DEFAULT_JOIN_KEY).unwrap();
        assert_eq!(merged.geometry_count(), 1);
    }

    #[test]
    fn unparseable_key_cast_is_key_type_error() {
        let mut geo = zones();
        geo.attributes = df!(
            "FAF_Zone" => &["eleven", "12", "19"],
            "name" => &["a", "b", "c"]
        )
        .unwrap();
        let table = df!("FAF_Zone" => &[12i64]).unwrap();
        let err = merge_frames(&table, &geo, DEFAULT_JOIN_KEY).unwrap_err();
        assert!(matches!(err, GeoError::KeyType { .. }));
    }

    #[test]
    fn merge_on_missing_path_is_file_not_found() {
        let tmp = tempdir().unwrap();
        let table = df!("FAF_Zone" => &[11i64]).unwrap();
        let err = merge(&table, tmp.path().join("nope.shp")).unwrap_err();
        assert!(matches!(err, GeoError::FileNotFound { .. }));
    }

    #[test]
    fn merge_reads_shapefile_from_disk() {
        let tmp = tempdir().unwrap();
        let shp = tmp.path().join("zones.shp");
        persist(&zones(), &shp).unwrap();

        let table = df!(
            "FAF_Zone" => &[12i64, 13],
            "tons" => &[10.25, 3.0]
        )
        .unwrap();
        let merged = merge(&table, &shp).unwrap();
        assert_eq!(merged.height(), 2);
        assert_eq!(merged.geometry_count(), 1);
        assert!(merged.column_names().contains(&"name"));
    }

    #[test]
    fn shared_column_names_survive_persisting() {
        let mut geo = zones();
        geo.attributes = df!(
            "FAF_Zone" => &[11i64, 12, 19],
            "population" => &[200i64, 180, 90]
        )
        .unwrap();
        let table = df!(
            "FAF_Zone" => &[12i64, 11],
            "population" => &[7i64, 8]
        )
        .unwrap();
        let merged = merge_frames(&table, &geo, DEFAULT_JOIN_KEY).unwrap();
        assert!(merged.column_names().contains(&"population_right"));

        let tmp = tempdir().unwrap();
        let shp = tmp.path().join("merged.shp");
        persist(&merged, &shp).unwrap();
        let back = read_shapefile(&shp).unwrap();
        assert_eq!(
            back.column_names(),
            vec!["FAF_Zone", "population", "populati_1"]
        );
        let right: Vec<Option<i64>> = back
            .attributes
            .column("populati_1")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(right, vec![Some(180), Some(200)]);
    }
}
