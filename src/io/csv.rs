//! Zone table export.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter, NamedFrom, PlSmallStr}, series::Series};

use crate::layer::{FieldType, Value, VectorLayer};

/// Attribute table of a layer as a DataFrame, one column per schema field.
pub fn zone_table(layer: &VectorLayer) -> Result<DataFrame> {
    let columns = layer.schema().fields().iter().enumerate()
        .map(|(i, field)| {
            let values = layer.features().iter().map(move |feature| &feature.values[i]);
            let name = PlSmallStr::from(field.name.as_str());
            let series = match field.ty {
                FieldType::Bool => Series::new(name, values.map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                }).collect::<Vec<_>>()),
                FieldType::Integer => Series::new(name, values.map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                }).collect::<Vec<_>>()),
                FieldType::Float => Series::new(name, values.map(Value::as_f64).collect::<Vec<_>>()),
                FieldType::Text => Series::new(name, values.map(|v| match v {
                    Value::Null => None,
                    other => Some(other.to_string()),
                }).collect::<Vec<_>>()),
            };
            Column::from(series)
        })
        .collect::<Vec<Column>>();

    DataFrame::new(columns).context("[io::csv::zone_table] Failed to build zone table")
}

/// Write the attribute table of a layer to a CSV file.
pub fn write_zone_table(layer: &VectorLayer, path: &Path) -> Result<()> {
    let mut df = zone_table(layer)?;
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write_zone_table] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("[io::csv::write_zone_table] Failed to write CSV to {:?}", path))
}
