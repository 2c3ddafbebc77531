use geo::{
    Area, BoundingRect, CoordsIter, Euclidean, Geometry, Length, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Rect,
};

use crate::error::{Error, Result};

/// Broad geometry class, which decides how a feature is rolled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

/// A feature geometry normalized to its multi-part form.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Points(MultiPoint<f64>),
    Lines(MultiLineString<f64>),
    Polygons(MultiPolygon<f64>),
}

impl Shape {
    /// Normalize a host geometry. Non-finite coordinates and geometry
    /// collections cannot be clipped and are reported against `fid`.
    pub fn from_geometry(geometry: &Geometry<f64>, fid: Option<u64>) -> Result<Self> {
        if geometry.coords_iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
            return Err(Error::geometry(fid, "non-finite coordinate"));
        }

        Ok(match geometry {
            Geometry::Point(p) => Shape::Points(MultiPoint(vec![*p])),
            Geometry::MultiPoint(mp) => Shape::Points(mp.clone()),
            Geometry::Line(line) => Shape::Lines(MultiLineString(vec![LineString(vec![line.start, line.end])])),
            Geometry::LineString(ls) => Shape::Lines(MultiLineString(vec![ls.clone()])),
            Geometry::MultiLineString(mls) => Shape::Lines(mls.clone()),
            Geometry::Polygon(p) => Shape::Polygons(MultiPolygon(vec![p.clone()])),
            Geometry::MultiPolygon(mp) => Shape::Polygons(mp.clone()),
            Geometry::Rect(rect) => Shape::Polygons(MultiPolygon(vec![rect.to_polygon()])),
            Geometry::Triangle(triangle) => Shape::Polygons(MultiPolygon(vec![triangle.to_polygon()])),
            Geometry::GeometryCollection(_) => return Err(Error::geometry(fid, "geometry collections cannot be clipped")),
        })
    }

    #[inline]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Points(_) => GeometryKind::Point,
            Shape::Lines(_) => GeometryKind::Line,
            Shape::Polygons(_) => GeometryKind::Polygon,
        }
    }

    /// Length for lines, area for polygons, zero for points.
    pub fn measure(&self) -> f64 {
        match self {
            Shape::Points(_) => 0.0,
            Shape::Lines(mls) => planar_length(mls),
            Shape::Polygons(mp) => mp.unsigned_area(),
        }
    }

    /// True when the shape cannot contribute to any zone.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Points(mp) => mp.0.is_empty(),
            Shape::Lines(_) | Shape::Polygons(_) => self.measure() <= 0.0,
        }
    }

    #[inline]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Shape::Points(mp) => mp.bounding_rect(),
            Shape::Lines(mls) => mls.bounding_rect(),
            Shape::Polygons(mp) => mp.bounding_rect(),
        }
    }

    pub fn into_geometry(self) -> Geometry<f64> {
        match self {
            Shape::Points(mp) if mp.0.len() == 1 => Geometry::Point(mp.0[0]),
            Shape::Points(mp) => Geometry::MultiPoint(mp),
            Shape::Lines(mut mls) if mls.0.len() == 1 => Geometry::LineString(mls.0.remove(0)),
            Shape::Lines(mls) => Geometry::MultiLineString(mls),
            Shape::Polygons(mp) => Geometry::MultiPolygon(mp),
        }
    }
}

/// Planar length of a multi-line, in layer units.
#[inline]
pub fn planar_length(mls: &MultiLineString<f64>) -> f64 {
    Euclidean.length(mls)
}
