use serde_json::{Map, Value as JsonValue};

use crate::{geom::GeometryKind, stats::ZoneStats};

/// Aggregates of one zone, in zone order.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneResult {
    pub zone: usize,
    /// Resolved label, or the positional identifier.
    pub label: String,
    pub count: u64,
    pub sum: f64,
    /// Mean cell value; raster aggregation only.
    pub density: Option<f64>,
}

impl ZoneResult {
    pub fn raster(zone: usize, label: String, stats: ZoneStats) -> Self {
        Self { zone, label, count: stats.count, sum: stats.sum, density: Some(stats.mean()) }
    }

    pub fn vector(zone: usize, label: String, stats: ZoneStats) -> Self {
        Self { zone, label, count: stats.count, sum: stats.sum, density: None }
    }
}

/// What one fragment of one feature contributed to one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRecord {
    pub zone: usize,
    pub label: String,
    /// Id of the source feature.
    pub fragment_id: u64,
    pub kind: GeometryKind,
    /// The feature's own value before splitting.
    pub original_value: Option<f64>,
    /// Clipped length (lines) or area (polygons).
    pub measure: Option<f64>,
    /// Value attributed to this zone.
    pub value: f64,
    /// Zone sum right after this record was added.
    pub running_sum: f64,
}

impl ContributionRecord {
    /// Serialize with the caller's field names for label, value and sum.
    pub fn to_json(&self, label_field: &str, value_field: &str, sum_field: &str) -> JsonValue {
        let mut map = Map::new();
        map.insert(label_field.to_string(), JsonValue::from(self.label.as_str()));
        map.insert(value_field.to_string(), JsonValue::from(self.value));
        map.insert("original".to_string(), self.original_value.map_or(JsonValue::Null, JsonValue::from));
        match (self.kind, self.measure) {
            (GeometryKind::Line, Some(length)) => { map.insert("length".to_string(), JsonValue::from(length)); }
            (GeometryKind::Polygon, Some(area)) => { map.insert("area".to_string(), JsonValue::from(area)); }
            _ => {}
        }
        map.insert("id".to_string(), JsonValue::from(self.fragment_id));
        map.insert(sum_field.to_string(), JsonValue::from(self.running_sum));
        JsonValue::Object(map)
    }
}
