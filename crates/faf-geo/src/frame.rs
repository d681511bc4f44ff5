use crate::error::{GeoError, GeoResult};
use polars::prelude::DataFrame;
use shapefile::Shape;
use std::fmt;

/// Attribute table plus one optional geometry per row.
///
/// `geometry[i]` belongs to row `i` of `attributes`; rows without a geometry
/// (for example unmatched rows of a left join) hold `None`. `projection` is the
/// WKT text of the `.prj` sidecar, carried through merges untouched.
pub struct GeoFrame {
    pub attributes: DataFrame,
    pub geometry: Vec<Option<Shape>>,
    pub projection: Option<String>,
}

impl GeoFrame {
    pub fn new(
        attributes: DataFrame,
        geometry: Vec<Option<Shape>>,
        projection: Option<String>,
    ) -> GeoResult<Self> {
        if attributes.height() != geometry.len() {
            return Err(GeoError::Invalid(format!(
                "attribute table has {} rows but {} geometries were supplied",
                attributes.height(),
                geometry.len()
            )));
        }
        Ok(Self {
            attributes,
            geometry,
            projection,
        })
    }

    pub fn height(&self) -> usize {
        self.attributes.height()
    }

    /// Rows that carry a real (non-null) shape.
    pub fn geometry_count(&self) -> usize {
        self.geometry
            .iter()
            .filter(|shape| !matches!(shape, None | Some(Shape::NullShape)))
            .count()
    }

    /// Name of the first non-null shape type, if any row has one.
    pub fn geometry_type(&self) -> Option<&'static str> {
        self.geometry
            .iter()
            .flatten()
            .map(shape_kind)
            .find(|kind| *kind != "NullShape")
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.attributes.get_column_names()
    }
}

impl fmt::Debug for GeoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<Option<&str>> = self
            .geometry
            .iter()
            .map(|shape| shape.as_ref().map(shape_kind))
            .collect();
        f.debug_struct("GeoFrame")
            .field("attributes", &self.attributes)
            .field("geometry", &kinds)
            .field("projection", &self.projection)
            .finish()
    }
}

/// `Shape` is not `Clone`; every variant's payload is.
pub fn clone_shape(shape: &Shape) -> Shape {
    match shape {
        Shape::NullShape => Shape::NullShape,
        Shape::Point(s) => Shape::Point(s.clone()),
        Shape::PointM(s) => Shape::PointM(s.clone()),
        Shape::PointZ(s) => Shape::PointZ(s.clone()),
        Shape::Polyline(s) => Shape::Polyline(s.clone()),
        Shape::PolylineM(s) => Shape::PolylineM(s.clone()),
        Shape::PolylineZ(s) => Shape::PolylineZ(s.clone()),
        Shape::Polygon(s) => Shape::Polygon(s.clone()),
        Shape::PolygonM(s) => Shape::PolygonM(s.clone()),
        Shape::PolygonZ(s) => Shape::PolygonZ(s.clone()),
        Shape::Multipoint(s) => Shape::Multipoint(s.clone()),
        Shape::MultipointM(s) => Shape::MultipointM(s.clone()),
        Shape::MultipointZ(s) => Shape::MultipointZ(s.clone()),
        Shape::Multipatch(s) => Shape::Multipatch(s.clone()),
    }
}

pub fn shape_kind(shape: &Shape) -> &'static str {
    match shape {
        Shape::NullShape => "NullShape",
        Shape::Point(_) => "Point",
        Shape::PointM(_) => "PointM",
        Shape::PointZ(_) => "PointZ",
        Shape::Polyline(_) => "Polyline",
        Shape::PolylineM(_) => "PolylineM",
        Shape::PolylineZ(_) => "PolylineZ",
        Shape::Polygon(_) => "Polygon",
        Shape::PolygonM(_) => "PolygonM",
        Shape::PolygonZ(_) => "PolygonZ",
        Shape::Multipoint(_) => "Multipoint",
        Shape::MultipointM(_) => "MultipointM",
        Shape::MultipointZ(_) => "MultipointZ",
        Shape::Multipatch(_) => "Multipatch",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use shapefile::Point;

    #[test]
    fn new_rejects_length_mismatch() {
        let attributes = df!("FAF_Zone" => &[11i64, 12]).unwrap();
        let err = GeoFrame::new(attributes, vec![None], None).unwrap_err();
        assert!(err.to_string().contains("2 rows"));
    }

    #[test]
    fn geometry_helpers_skip_nulls() {
        let attributes = df!("FAF_Zone" => &[11i64, 12, 19]).unwrap();
        let frame = GeoFrame::new(
            attributes,
            vec![
                None,
                Some(Shape::NullShape),
                Some(Shape::Point(Point::new(-86.8, 33.5))),
            ],
            None,
        )
        .unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.geometry_count(), 1);
        assert_eq!(frame.geometry_type(), Some("Point"));

        let debug = format!("{frame:?}");
        assert!(debug.contains("Some(\"Point\")"));
    }

    #[test]
    fn cloned_shapes_keep_their_coordinates() {
        let shape = Shape::Point(Point::new(-86.8, 33.5));
        match clone_shape(&shape) {
            Shape::Point(p) => assert_eq!((p.x, p.y), (-86.8, 33.5)),
            other => panic!("unexpected geometry {}", shape_kind(&other)),
        }
        assert_eq!(shape_kind(&clone_shape(&Shape::NullShape)), "NullShape");
    }
}
