mod record;

pub use record::{ContributionRecord, ZoneResult};

use crate::{
    config::{COUNT_FIELD, DENSITY_FIELD},
    error::{Error, Result},
    layer::{Field, FieldType, Schema, Value, VectorLayer},
    zone::ZoneModel,
};

/// Which statistics the zone table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// `[label, count, sum, density]`
    Raster,
    /// `[label, count, sum]`
    Vector,
}

/// Build the output layer: one feature per zone, in zone order, with the zone
/// boundary as geometry and the aggregates as numeric fields.
pub fn assemble(model: &ZoneModel, results: &[ZoneResult], sum_field: &str, kind: ResultKind, name: &str) -> Result<VectorLayer> {
    if results.len() != model.len() {
        return Err(Error::Aggregation(format!(
            "{} results for {} zones", results.len(), model.len()
        )));
    }

    let mut names = vec![model.label_field(), COUNT_FIELD, sum_field];
    if kind == ResultKind::Raster {
        names.push(DENSITY_FIELD);
    }
    for (i, field) in names.iter().enumerate() {
        if names[..i].contains(field) {
            return Err(Error::Configuration(format!("output field '{field}' is used twice")));
        }
    }

    let mut fields = vec![
        Field::new(model.label_field(), FieldType::Text),
        Field::new(COUNT_FIELD, FieldType::Integer),
        Field::new(sum_field, FieldType::Float),
    ];
    if kind == ResultKind::Raster {
        fields.push(Field::new(DENSITY_FIELD, FieldType::Float));
    }

    let mut layer = VectorLayer::new(name, Schema::new(fields));
    for (zone, result) in model.zones().iter().zip(results) {
        let mut values = vec![
            Value::Text(result.label.clone()),
            Value::Integer(result.count as i64),
            Value::Float(result.sum),
        ];
        if kind == ResultKind::Raster {
            values.push(Value::Float(result.density.unwrap_or(0.0)));
        }
        layer.push(zone.id() as u64, zone.boundary().clone(), values);
    }
    Ok(layer)
}

#[cfg(test)]
mod tests {
    use geo::{Coord, Rect};

    use super::*;
    use crate::stats::ZoneStats;

    fn aoi() -> ZoneModel {
        ZoneModel::entire_area(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }))
    }

    #[test]
    fn vector_table_has_three_fields() {
        let results = vec![ZoneResult::vector(0, "Entire area".into(), ZoneStats { count: 3, sum: 3.0 })];
        let layer = assemble(&aoi(), &results, "aggr_sum", ResultKind::Vector, "aggregation").unwrap();

        let names = layer.schema().fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["area", "count", "aggr_sum"]);
        assert_eq!(layer.value(0, "area"), Some(&Value::Text("Entire area".into())));
        assert_eq!(layer.value(0, "count"), Some(&Value::Integer(3)));
    }

    #[test]
    fn raster_table_adds_density() {
        let results = vec![ZoneResult::raster(0, "Entire area".into(), ZoneStats { count: 2, sum: 5.0 })];
        let layer = assemble(&aoi(), &results, "SUMM_AGGR", ResultKind::Raster, "aggregation").unwrap();
        assert_eq!(layer.value(0, "density"), Some(&Value::Float(2.5)));
        assert_eq!(layer.value(0, "SUMM_AGGR"), Some(&Value::Float(5.0)));
    }

    #[test]
    fn clashing_sum_field_is_rejected() {
        let results = vec![ZoneResult::vector(0, "Entire area".into(), ZoneStats::default())];
        let err = assemble(&aoi(), &results, "count", ResultKind::Vector, "aggregation").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
