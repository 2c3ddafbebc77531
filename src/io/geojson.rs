use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde_json::{json, Value as JsonValue};

use crate::{
    geom::Shape,
    io::{layer_from_rows, layer_name},
    layer::{Value, VectorLayer},
};

/// Read a GeoJSON FeatureCollection file into a vector layer named after the file.
pub fn read_geojson(path: &Path) -> Result<VectorLayer> {
    let bytes = fs::read(path)
        .with_context(|| format!("[io::geojson::read_geojson] Failed to read {}", path.display()))?;
    parse_geojson(&layer_name(path), &bytes)
        .with_context(|| format!("[io::geojson::read_geojson] Invalid GeoJSON in {}", path.display()))
}

/// Parse GeoJSON FeatureCollection bytes. Feature ids become fids when they
/// are non-negative integers; otherwise features are numbered in order.
pub fn parse_geojson(name: &str, bytes: &[u8]) -> Result<VectorLayer> {
    let value: JsonValue = serde_json::from_slice(bytes).context("[io::geojson::parse_geojson] Failed to parse JSON")?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson::parse_geojson] Missing 'features' array"))?;

    let mut rows = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let fid = feature["id"].as_u64().unwrap_or(i as u64);
        let geometry = parse_geometry(&feature["geometry"])
            .with_context(|| format!("[io::geojson::parse_geojson] Feature {fid}"))?;
        let properties = feature["properties"].as_object()
            .map(|props| props.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            .unwrap_or_else(BTreeMap::new);
        rows.push((fid, geometry, properties));
    }

    let layer = layer_from_rows(name.to_string(), rows);
    Ok(match parse_epsg(&value) {
        Some(epsg) => layer.with_epsg(epsg),
        None => layer,
    })
}

/// EPSG code from a legacy `crs` member (`"EPSG:4326"` or `"urn:ogc:def:crs:EPSG::4326"`).
fn parse_epsg(value: &JsonValue) -> Option<u32> {
    let name = value["crs"]["properties"]["name"].as_str()?;
    if !name.to_ascii_uppercase().contains("EPSG") {
        return None;
    }
    name.rsplit(':').next()?.trim().parse().ok()
}

fn parse_geometry(geometry: &JsonValue) -> Result<Geometry<f64>> {
    let coords = &geometry["coordinates"];
    Ok(match geometry["type"].as_str() {
        Some("Point") => Geometry::Point(Point(parse_coord(coords)?)),
        Some("MultiPoint") => Geometry::MultiPoint(MultiPoint(
            array(coords)?.iter().map(|c| parse_coord(c).map(Point)).collect::<Result<_>>()?
        )),
        Some("LineString") => Geometry::LineString(parse_line(coords)?),
        Some("MultiLineString") => Geometry::MultiLineString(MultiLineString(
            array(coords)?.iter().map(parse_line).collect::<Result<_>>()?
        )),
        Some("Polygon") => Geometry::Polygon(parse_polygon(coords)?),
        Some("MultiPolygon") => Geometry::MultiPolygon(MultiPolygon(
            array(coords)?.iter().map(parse_polygon).collect::<Result<_>>()?
        )),
        Some(other) => bail!("Unsupported geometry type '{other}'"),
        None => bail!("Feature has no geometry type"),
    })
}

fn array(value: &JsonValue) -> Result<&Vec<JsonValue>> {
    value.as_array().ok_or_else(|| anyhow!("Expected a coordinate array, got {value}"))
}

fn parse_coord(value: &JsonValue) -> Result<Coord<f64>> {
    match array(value)?.as_slice() {
        [x, y, ..] => Ok(Coord {
            x: x.as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?,
            y: y.as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?,
        }),
        _ => bail!("Coordinate needs at least two values"),
    }
}

fn parse_line(value: &JsonValue) -> Result<LineString<f64>> {
    Ok(LineString(array(value)?.iter().map(parse_coord).collect::<Result<_>>()?))
}

fn parse_polygon(value: &JsonValue) -> Result<Polygon<f64>> {
    let mut rings = array(value)?.iter().map(parse_line);
    let exterior = rings.next().ok_or_else(|| anyhow!("Polygon is missing its exterior ring"))??;
    Ok(Polygon::new(exterior, rings.collect::<Result<_>>()?))
}

/// Serialize a vector layer as a GeoJSON FeatureCollection.
pub fn to_geojson(layer: &VectorLayer) -> Result<JsonValue> {
    let features = layer.features().iter()
        .map(|feature| {
            let properties = layer.schema().fields().iter().zip(&feature.values)
                .map(|(field, value)| (field.name.clone(), value.to_json()))
                .collect::<serde_json::Map<_, _>>();
            Ok(json!({
                "type": "Feature",
                "id": feature.fid,
                "geometry": geometry_to_json(&feature.geometry)?,
                "properties": properties,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut collection = json!({ "type": "FeatureCollection", "features": features });
    if let Some(epsg) = layer.epsg() {
        collection["crs"] = json!({ "type": "name", "properties": { "name": format!("EPSG:{epsg}") } });
    }
    Ok(collection)
}

/// Write a vector layer to a GeoJSON file.
pub fn write_geojson(layer: &VectorLayer, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec(&to_geojson(layer)?)
        .context("[io::geojson::write_geojson] Failed to serialize GeoJSON")?;
    fs::write(path, bytes)
        .with_context(|| format!("[io::geojson::write_geojson] Failed to write {}", path.display()))
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Result<JsonValue> {
    fn coord(c: &Coord<f64>) -> JsonValue { json!([c.x, c.y]) }
    fn line(ls: &LineString<f64>) -> JsonValue { ls.coords().map(coord).collect() }
    fn polygon(p: &Polygon<f64>) -> JsonValue {
        std::iter::once(p.exterior()).chain(p.interiors()).map(line).collect()
    }

    Ok(match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": coord(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| coord(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": line(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(line).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon).collect::<Vec<_>>(),
        }),
        other => geometry_to_json(&Shape::from_geometry(other, None)?.into_geometry())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::FieldType;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4326" } },
        "features": [
            { "type": "Feature", "id": 7,
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]] },
              "properties": { "KAB_NAME": "JAKARTA BARAT", "POP": 100 } },
            { "type": "Feature",
              "geometry": { "type": "Point", "coordinates": [0.5, 0.5] },
              "properties": { "KAB_NAME": "JAKARTA PUSAT", "POP": 2.5 } }
        ]
    }"#;

    #[test]
    fn parses_features_and_properties() {
        let layer = parse_geojson("districts", DISTRICTS.as_bytes()).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.epsg(), Some(4326));
        assert_eq!(layer.features()[0].fid, 7);
        assert_eq!(layer.features()[1].fid, 1);
        assert_eq!(layer.schema().field("POP").unwrap().ty, FieldType::Float);
        assert_eq!(layer.value(0, "KAB_NAME"), Some(&Value::Text("JAKARTA BARAT".into())));
        assert!(matches!(layer.features()[0].geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn round_trips_through_file() {
        let layer = parse_geojson("districts", DISTRICTS.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("districts.geojson");
        write_geojson(&layer, &path).unwrap();

        let back = read_geojson(&path).unwrap();
        assert_eq!(back.name(), "districts");
        assert_eq!(back.len(), layer.len());
        assert_eq!(back.epsg(), Some(4326));
        assert_eq!(back.value(1, "POP"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn rejects_unknown_geometry() {
        let bytes = br#"{ "features": [ { "geometry": { "type": "Curve", "coordinates": [] } } ] }"#;
        assert!(parse_geojson("bad", bytes).is_err());
    }
}
