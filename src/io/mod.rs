//! Readers and writers that turn files into layers and results into files.

mod csv;
mod geojson;
mod grid;
mod shp;

pub use csv::{write_zone_table, zone_table};
pub use geojson::{parse_geojson, read_geojson, to_geojson, write_geojson};
pub use grid::{parse_ascii_grid, read_ascii_grid};
pub use shp::read_shapefile;

use std::{collections::BTreeMap, path::Path};

use anyhow::{bail, Result};

use crate::layer::{Field, FieldType, Layer, Schema, Value, VectorLayer};

/// Read a layer, choosing the reader from the file extension.
pub fn read_layer(path: &Path) -> Result<Layer> {
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("geojson" | "json") => Ok(read_geojson(path)?.into()),
        Some("shp") => Ok(read_shapefile(path)?.into()),
        Some("asc") => Ok(read_ascii_grid(path)?.into()),
        _ => bail!("[io::read_layer] Unsupported layer format: {}", path.display()),
    }
}

/// Layer name derived from a file path.
pub(crate) fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layer".to_string())
}

/// Build a layer from rows of named values. Fields are sorted by name; a
/// field that mixes integers and floats is a float, any other mix is text.
pub(crate) fn layer_from_rows(name: String, rows: Vec<(u64, geo::Geometry<f64>, BTreeMap<String, Value>)>) -> VectorLayer {
    let mut types = BTreeMap::<String, Option<FieldType>>::new();
    for (_, _, row) in &rows {
        for (key, value) in row {
            let slot = types.entry(key.clone()).or_default();
            *slot = merge_type(*slot, value);
        }
    }

    let schema = Schema::new(types.into_iter()
        .map(|(name, ty)| Field::new(name, ty.unwrap_or(FieldType::Text)))
        .collect());

    let mut layer = VectorLayer::new(name, schema.clone());
    for (fid, geometry, mut row) in rows {
        let values = schema.fields().iter()
            .map(|field| coerce(row.remove(&field.name).unwrap_or_default(), field.ty))
            .collect();
        layer.push(fid, geometry, values);
    }
    layer
}

fn type_of(value: &Value) -> Option<FieldType> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(FieldType::Bool),
        Value::Integer(_) => Some(FieldType::Integer),
        Value::Float(_) => Some(FieldType::Float),
        Value::Text(_) => Some(FieldType::Text),
    }
}

fn merge_type(current: Option<FieldType>, value: &Value) -> Option<FieldType> {
    match (current, type_of(value)) {
        (ty, None) | (None, ty) => ty,
        (Some(a), Some(b)) if a == b => Some(a),
        (Some(FieldType::Integer | FieldType::Float), Some(FieldType::Integer | FieldType::Float)) => Some(FieldType::Float),
        _ => Some(FieldType::Text),
    }
}

fn coerce(value: Value, ty: FieldType) -> Value {
    match (value, ty) {
        (Value::Integer(i), FieldType::Float) => Value::Float(i as f64),
        (Value::Null, _) => Value::Null,
        (value @ (Value::Bool(_) | Value::Integer(_) | Value::Float(_)), FieldType::Text) => Value::Text(value.to_string()),
        (value, _) => value,
    }
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;

    fn row(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn infers_and_coerces_field_types() {
        let layer = layer_from_rows("l".into(), vec![
            (0, point!(x: 0.0, y: 0.0).into(), row(&[("b", Value::Integer(1)), ("a", "x".into())])),
            (1, point!(x: 1.0, y: 0.0).into(), row(&[("b", Value::Float(2.5)), ("a", Value::Integer(4))])),
            (2, point!(x: 2.0, y: 0.0).into(), row(&[("c", Value::Null)])),
        ]);

        let fields = layer.schema().fields();
        assert_eq!(fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(fields[0].ty, FieldType::Text);
        assert_eq!(fields[1].ty, FieldType::Float);
        assert_eq!(layer.value(0, "b"), Some(&Value::Float(1.0)));
        assert_eq!(layer.value(1, "a"), Some(&Value::Text("4".into())));
        assert_eq!(layer.value(2, "a"), Some(&Value::Null));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(read_layer(Path::new("zones.kml")).is_err());
    }
}
