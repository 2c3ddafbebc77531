use std::{collections::BTreeMap, path::Path};

use anyhow::{bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::{dbase::FieldValue, Reader, Shape};
use tracing::warn;

use crate::{
    io::{layer_from_rows, layer_name},
    layer::{Value, VectorLayer},
};

/// Read a shapefile (and its `.dbf`) into a vector layer named after the file.
/// Null shapes are skipped; fids are record positions.
pub fn read_shapefile(path: &Path) -> Result<VectorLayer> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp::read_shapefile] Failed to open shapefile: {}", path.display()))?;

    let mut rows = Vec::new();
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("[io::shp::read_shapefile] Error reading record {i}"))?;
        let Some(geometry) = shp_to_geo(&shape)
            .with_context(|| format!("[io::shp::read_shapefile] Record {i}"))?
        else {
            warn!(record = i, "skipping null shape");
            continue;
        };

        let values = record.into_iter()
            .map(|(name, value)| (name, field_value(value)))
            .collect::<BTreeMap<_, _>>();
        rows.push((i as u64, geometry, values));
    }

    Ok(layer_from_rows(layer_name(path), rows))
}

/// Convert a shapefile shape to a geo geometry; `None` for null shapes.
fn shp_to_geo(shape: &Shape) -> Result<Option<Geometry<f64>>> {
    Ok(Some(match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Point::new(p.x, p.y).into(),
        Shape::PointM(p) => Point::new(p.x, p.y).into(),
        Shape::PointZ(p) => Point::new(p.x, p.y).into(),
        Shape::Multipoint(mp) => MultiPoint(mp.points().iter().map(|p| Point::new(p.x, p.y)).collect()).into(),
        Shape::Polyline(pl) => MultiLineString(pl.parts().iter()
            .map(|part| LineString(part.iter().map(|p| Coord { x: p.x, y: p.y }).collect()))
            .collect()).into(),
        Shape::Polygon(p) => polygon_to_geo(p).into(),
        other => bail!("Unsupported shape type {:?}", other.shapetype()),
    }))
}

/// Group rings into polygons: an outer ring (clockwise) owns the holes that follow it.
fn polygon_to_geo(p: &shapefile::Polygon) -> MultiPolygon<f64> {
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0]);
        }
    }

    /// Signed area of a ring (negative when clockwise).
    fn signed_area(pts: &[Coord<f64>]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    let mut polys = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();

    for ring in p.rings() {
        let mut coords = ring.points().iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect::<Vec<_>>();
        ensure_closed(&mut coords);
        if signed_area(&coords) < 0.0 {
            if let Some(ext) = exterior.take() {
                polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(LineString(coords));
        } else {
            holes.push(LineString(coords));
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

fn field_value(value: FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) => Value::Text(s.trim().to_string()),
        FieldValue::Character(None) => Value::Null,
        FieldValue::Numeric(n) => n.map(Value::Float).unwrap_or_default(),
        FieldValue::Float(f) => f.map(|f| Value::Float(f as f64)).unwrap_or_default(),
        FieldValue::Logical(b) => b.map(Value::Bool).unwrap_or_default(),
        FieldValue::Integer(i) => Value::Integer(i as i64),
        FieldValue::Double(d) | FieldValue::Currency(d) => Value::Float(d),
        FieldValue::Memo(s) => Value::Text(s),
        other => Value::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use shapefile::{Point as ShpPoint, PolygonRing};

    use super::*;

    #[test]
    fn clockwise_rings_start_polygons() {
        let outer = vec![
            ShpPoint::new(0.0, 0.0), ShpPoint::new(0.0, 4.0), ShpPoint::new(4.0, 4.0),
            ShpPoint::new(4.0, 0.0), ShpPoint::new(0.0, 0.0),
        ];
        let hole = vec![
            ShpPoint::new(1.0, 1.0), ShpPoint::new(2.0, 1.0), ShpPoint::new(2.0, 2.0),
            ShpPoint::new(1.0, 2.0), ShpPoint::new(1.0, 1.0),
        ];
        let shape = shapefile::Polygon::with_rings(vec![PolygonRing::Outer(outer), PolygonRing::Inner(hole)]);

        let mp = polygon_to_geo(&shape);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
    }

    #[test]
    fn dbase_values_map_to_layer_values() {
        assert_eq!(field_value(FieldValue::Character(Some(" Bogor ".into()))), Value::Text("Bogor".into()));
        assert_eq!(field_value(FieldValue::Numeric(None)), Value::Null);
        assert_eq!(field_value(FieldValue::Numeric(Some(3.0))), Value::Float(3.0));
        assert_eq!(field_value(FieldValue::Integer(2)), Value::Integer(2));
    }

    #[test]
    fn null_shape_is_skipped() {
        assert!(shp_to_geo(&Shape::NullShape).unwrap().is_none());
    }
}
