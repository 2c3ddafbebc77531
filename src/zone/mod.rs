mod index;

use geo::{Area, BoundingRect, MultiPolygon, Rect};
use rstar::RTree;
use smallvec::SmallVec;
use tracing::debug;

use index::{envelope_of, ZoneEnvelope};

use crate::{
    config::{AOI_LABEL_FIELD, ENTIRE_AREA, POSITIONAL_LABEL_FIELD},
    error::{Error, Result},
    geom::Shape,
    layer::{Value, VectorLayer},
};

/// A polygonal region that impact results are rolled up into.
#[derive(Debug, Clone)]
pub struct Zone {
    id: usize,
    label: Option<String>,
    boundary: MultiPolygon<f64>,
}

impl Zone {
    /// Position of the zone in model order.
    #[inline] pub fn id(&self) -> usize { self.id }

    #[inline] pub fn label(&self) -> Option<&str> { self.label.as_deref() }

    #[inline] pub fn boundary(&self) -> &MultiPolygon<f64> { &self.boundary }

    /// True when nothing is left of the boundary, e.g. after clipping.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boundary.0.is_empty() || self.boundary.unsigned_area() <= 0.0
    }
}

/// The ordered zones of one aggregation run, with an R-tree over their envelopes.
#[derive(Debug, Clone)]
pub struct ZoneModel {
    zones: Vec<Zone>,
    label_attribute: Option<String>,
    aoi: bool,
    rtree: RTree<ZoneEnvelope>,
}

impl ZoneModel {
    /// A single synthetic zone covering the whole extent.
    pub fn entire_area(extent: Rect<f64>) -> Self {
        let zone = Zone {
            id: 0,
            label: Some(ENTIRE_AREA.to_string()),
            boundary: MultiPolygon(vec![extent.to_polygon()]),
        };
        let mut model = Self {
            zones: vec![zone],
            label_attribute: Some(AOI_LABEL_FIELD.to_string()),
            aoi: true,
            rtree: RTree::new(),
        };
        model.rebuild_index();
        model
    }

    /// A model without zones.
    pub fn empty() -> Self {
        Self { zones: Vec::new(), label_attribute: None, aoi: false, rtree: RTree::new() }
    }

    /// Zones from a polygon layer, in feature order, labelled by `label_attribute`.
    pub fn from_layer(layer: &VectorLayer, label_attribute: Option<String>) -> Result<Self> {
        let label_idx = label_attribute.as_deref().and_then(|name| layer.schema().index_of(name));

        let zones = layer.features().iter().enumerate()
            .map(|(id, feature)| {
                let boundary = match Shape::from_geometry(&feature.geometry, Some(feature.fid))? {
                    Shape::Polygons(mp) => mp,
                    other => return Err(Error::KeywordsNotValid(format!(
                        "zone layer '{}' has a non-polygon feature {} ({:?})",
                        layer.name(), feature.fid, other.kind()
                    ))),
                };
                let label = label_idx.and_then(|i| match &feature.values[i] {
                    Value::Null => None,
                    Value::Text(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                });
                Ok(Zone { id, label, boundary })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(layer = layer.name(), zones = zones.len(), label = ?label_attribute, "built zone model");

        let mut model = Self { zones, label_attribute, aoi: false, rtree: RTree::new() };
        model.rebuild_index();
        Ok(model)
    }

    #[inline] pub fn zones(&self) -> &[Zone] { &self.zones }

    #[inline] pub fn len(&self) -> usize { self.zones.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.zones.is_empty() }

    /// True for the synthetic single-zone model.
    #[inline] pub fn is_aoi(&self) -> bool { self.aoi }

    /// Attribute the zone labels were read from, if one was resolved.
    #[inline] pub fn label_attribute(&self) -> Option<&str> { self.label_attribute.as_deref() }

    /// Resolved label of zone `zone`, or `None`.
    #[inline]
    pub fn label_for(&self, zone: usize) -> Option<&str> {
        self.zones.get(zone).and_then(Zone::label)
    }

    /// Name of the label field written to output layers.
    #[inline]
    pub fn label_field(&self) -> &str {
        self.label_attribute.as_deref().unwrap_or(POSITIONAL_LABEL_FIELD)
    }

    /// Label of zone `zone`, falling back to its 1-based position.
    pub fn display_label(&self, zone: usize) -> String {
        match self.label_for(zone) {
            Some(label) => label.to_string(),
            None => (zone + 1).to_string(),
        }
    }

    /// Indices of non-empty zones whose envelope intersects `bbox`, in zone order.
    pub(crate) fn candidates(&self, bbox: &Rect<f64>) -> SmallVec<[usize; 8]> {
        let mut hits = self.rtree.locate_in_envelope_intersecting(&envelope_of(bbox))
            .map(ZoneEnvelope::zone)
            .collect::<SmallVec<[usize; 8]>>();
        hits.sort_unstable();
        hits
    }

    /// Replace the boundary of zone `zone`. The index must be rebuilt afterwards.
    pub(crate) fn set_boundary(&mut self, zone: usize, boundary: MultiPolygon<f64>) {
        self.zones[zone].boundary = boundary;
    }

    /// Rebuild the R-tree from the current boundaries, skipping empty zones.
    pub(crate) fn rebuild_index(&mut self) {
        self.rtree = RTree::bulk_load(
            self.zones.iter()
                .filter(|zone| !zone.is_empty())
                .filter_map(|zone| zone.boundary.bounding_rect().map(|bbox| ZoneEnvelope::new(zone.id, bbox)))
                .collect()
        );
    }
}

#[cfg(test)]
mod tests {
    use geo::{line_string, polygon, Coord, Polygon};

    use super::*;
    use crate::layer::{Field, FieldType, Schema};

    fn square(x: f64, y: f64) -> Polygon<f64> {
        polygon![(x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0)]
    }

    fn districts() -> VectorLayer {
        let mut layer = VectorLayer::new("districts", Schema::new(vec![
            Field::new("KAB_NAME", FieldType::Text),
        ]));
        layer.push(10, square(0.0, 0.0), vec!["Jakarta Barat".into()]);
        layer.push(11, square(1.0, 0.0), vec![Value::Null]);
        layer.push(12, square(5.0, 5.0), vec!["Jakarta Utara".into()]);
        layer
    }

    #[test]
    fn entire_area_is_a_single_labelled_zone() {
        let model = ZoneModel::entire_area(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 4.0, y: 2.0 }));
        assert!(model.is_aoi());
        assert_eq!(model.len(), 1);
        assert_eq!(model.label_for(0), Some("Entire area"));
        assert_eq!(model.label_field(), "area");
        assert_eq!(model.zones()[0].boundary().unsigned_area(), 8.0);
    }

    #[test]
    fn zones_keep_feature_order_and_labels() {
        let model = ZoneModel::from_layer(&districts(), Some("KAB_NAME".into())).unwrap();
        assert_eq!(model.len(), 3);
        assert_eq!(model.zones().iter().map(Zone::id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(model.label_for(0), Some("Jakarta Barat"));
        assert_eq!(model.label_for(1), None);
        assert_eq!(model.display_label(1), "2");
        assert_eq!(model.label_field(), "KAB_NAME");
    }

    #[test]
    fn unlabelled_model_uses_positional_field() {
        let model = ZoneModel::from_layer(&districts(), None).unwrap();
        assert_eq!(model.label_field(), "zone_id");
        assert_eq!(model.display_label(0), "1");
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn candidates_come_back_in_zone_order() {
        let model = ZoneModel::from_layer(&districts(), None).unwrap();
        let bbox = Rect::new(Coord { x: 0.5, y: 0.5 }, Coord { x: 1.5, y: 0.6 });
        assert_eq!(model.candidates(&bbox).as_slice(), &[0, 1]);
        let far = Rect::new(Coord { x: 20.0, y: 20.0 }, Coord { x: 21.0, y: 21.0 });
        assert!(model.candidates(&far).is_empty());
    }

    #[test]
    fn empty_zones_are_not_indexed() {
        let mut model = ZoneModel::from_layer(&districts(), None).unwrap();
        model.set_boundary(2, MultiPolygon(vec![]));
        model.rebuild_index();
        let bbox = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 });
        assert_eq!(model.candidates(&bbox).as_slice(), &[0, 1]);
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn non_polygon_zone_layer_is_rejected() {
        let mut layer = VectorLayer::new("roads", Schema::default());
        layer.push(1, line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)], vec![]);
        let err = ZoneModel::from_layer(&layer, None).unwrap_err();
        assert!(matches!(err, Error::KeywordsNotValid(_)));
    }

    #[test]
    fn zero_feature_layer_yields_no_zones() {
        let layer = VectorLayer::new("empty", Schema::default());
        let model = ZoneModel::from_layer(&layer, None).unwrap();
        assert!(model.is_empty());
    }
}
