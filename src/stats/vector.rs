use tracing::{debug, trace};

use crate::{
    config::{AggregationConfig, LineWeighting},
    error::Result,
    geom::{fragments, GeometryKind, Shape},
    layer::VectorLayer,
    output::{ContributionRecord, ZoneResult},
    stats::ZoneStats,
    zone::ZoneModel,
};

/// Zone results of a vector rollup plus the per-zone contribution detail.
#[derive(Debug, Clone, Default)]
pub struct VectorAggregation {
    pub results: Vec<ZoneResult>,
    /// One list per zone, in zone order.
    pub contributions: Vec<Vec<ContributionRecord>>,
}

impl VectorAggregation {
    /// Total number of fragments over all zones.
    pub fn fragment_count(&self) -> usize {
        self.contributions.iter().map(Vec::len).sum()
    }
}

/// Value that a fragment of measure `measure`, cut from a feature of total
/// measure `total`, attributes to its zone.
pub fn attributed_value(kind: GeometryKind, original: Option<f64>, measure: f64, total: f64, weighting: LineWeighting) -> f64 {
    match (kind, original) {
        (GeometryKind::Line, None) => measure,
        (GeometryKind::Line, Some(value)) => match weighting {
            LineWeighting::Fraction if total > 0.0 => value * measure / total,
            LineWeighting::Fraction => value,
            LineWeighting::FlaggedLength if value != 0.0 => measure,
            LineWeighting::FlaggedLength => 0.0,
        },
        (GeometryKind::Point | GeometryKind::Polygon, value) => value.unwrap_or(1.0),
    }
}

/// Roll `layer` up into the zones of `model`.
///
/// `value_idx` is the schema position of the value attribute; without one,
/// every feature counts one unit (lines count their length).
pub fn aggregate_vector(layer: &VectorLayer, model: &ZoneModel, value_idx: Option<usize>, config: &AggregationConfig) -> Result<VectorAggregation> {
    let mut stats = vec![ZoneStats::default(); model.len()];
    let mut contributions = vec![Vec::new(); model.len()];

    for feature in layer.features() {
        let shape = Shape::from_geometry(&feature.geometry, Some(feature.fid))?;
        if shape.is_degenerate() {
            trace!(fid = feature.fid, "skipping degenerate geometry");
            continue;
        }

        let original = value_idx.and_then(|i| feature.values[i].as_f64());
        let total = shape.measure();
        let kind = shape.kind();

        for fragment in fragments(&shape, model, config.polygon_membership) {
            let value = attributed_value(kind, original, fragment.measure, total, config.line_weighting);
            let zone = &mut stats[fragment.zone];
            zone.add(value);

            contributions[fragment.zone].push(ContributionRecord {
                zone: fragment.zone,
                label: model.display_label(fragment.zone),
                fragment_id: feature.fid,
                kind,
                original_value: original,
                measure: (kind != GeometryKind::Point).then_some(fragment.measure),
                value,
                running_sum: zone.sum,
            });
        }
    }

    let results = stats.into_iter().enumerate()
        .map(|(i, zone)| ZoneResult::vector(i, model.display_label(i), zone))
        .collect::<Vec<_>>();
    let aggregation = VectorAggregation { results, contributions };

    debug!(layer = layer.name(), features = layer.len(), fragments = aggregation.fragment_count(), "aggregated vector layer");
    Ok(aggregation)
}
