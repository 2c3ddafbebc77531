use geo::{BoundingRect, Coord, Geometry, Rect};

use crate::layer::{Schema, Value};

/// A single feature: geometry plus values aligned with the layer schema.
#[derive(Debug, Clone)]
pub struct Feature {
    pub fid: u64,
    pub geometry: Geometry<f64>,
    pub values: Vec<Value>,
}

/// An ordered collection of features sharing one schema.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    name: String,
    schema: Schema,
    features: Vec<Feature>,
    epsg: Option<u32>,
}

impl VectorLayer {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self { name: name.into(), schema, features: Vec::new(), epsg: None }
    }

    /// Set the EPSG code of the layer CRS.
    pub fn with_epsg(mut self, epsg: u32) -> Self {
        self.epsg = Some(epsg);
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn schema(&self) -> &Schema { &self.schema }

    #[inline] pub fn features(&self) -> &[Feature] { &self.features }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Append a feature. `values` must be aligned with the schema.
    pub fn push(&mut self, fid: u64, geometry: impl Into<Geometry<f64>>, values: Vec<Value>) {
        assert!(values.len() == self.schema.len(), "values.len() must equal schema.len()");
        self.features.push(Feature { fid, geometry: geometry.into(), values });
    }

    /// Value of `field` on the feature at position `idx`, if the field exists.
    #[inline]
    pub fn value(&self, idx: usize, field: &str) -> Option<&Value> {
        let i = self.schema.index_of(field)?;
        self.features.get(idx).map(|feature| &feature.values[i])
    }

    /// Iterate over the values of one field, in feature order.
    pub fn column(&self, field: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let i = self.schema.index_of(field)?;
        Some(self.features.iter().map(move |feature| &feature.values[i]))
    }

    /// Bounding rectangle of all feature geometries.
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.features.iter()
            .filter_map(|feature| feature.geometry.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point};

    use super::*;
    use crate::layer::{Field, FieldType};

    fn make_layer() -> VectorLayer {
        let mut layer = VectorLayer::new("roads", Schema::new(vec![
            Field::new("name", FieldType::Text),
            Field::new("flooded", FieldType::Float),
        ]));
        layer.push(1, line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 1.0)], vec!["a".into(), 1.0.into()]);
        layer.push(2, point!(x: -1.0, y: 3.0), vec!["b".into(), Value::Null]);
        layer
    }

    #[test]
    fn extent_covers_all_features() {
        let extent = make_layer().extent().unwrap();
        assert_eq!(extent.min(), Coord { x: -1.0, y: 0.0 });
        assert_eq!(extent.max(), Coord { x: 2.0, y: 3.0 });
    }

    #[test]
    fn empty_layer_has_no_extent() {
        let layer = VectorLayer::new("empty", Schema::default());
        assert!(layer.extent().is_none());
        assert!(layer.is_empty());
    }

    #[test]
    fn value_and_column_access() {
        let layer = make_layer();
        assert_eq!(layer.value(0, "flooded"), Some(&Value::Float(1.0)));
        assert_eq!(layer.value(1, "flooded"), Some(&Value::Null));
        assert!(layer.value(0, "missing").is_none());

        let names = layer.column("name").unwrap().filter_map(Value::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    #[should_panic(expected = "values.len() must equal schema.len()")]
    fn push_rejects_misaligned_values() {
        let mut layer = make_layer();
        layer.push(3, point!(x: 0.0, y: 0.0), vec![]);
    }
}
