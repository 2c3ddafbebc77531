//! The per-run aggregation context.
//!
//! A context is built once for one analysis run: it owns the zone model
//! clipped to the working extent, borrows the caller's layers and keyword
//! store, and holds the results of the last `aggregate` call.

use ahash::AHashMap;
use geo::{Coord, Rect};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::{
    config::{keys, AggregationConfig, ZonalStrategy, COUNT_FIELD},
    error::{Error, Result},
    geom::{fragments, prepare_zones, Shape},
    keywords::{keyword, resolve_label_attribute, Keyword, KeywordStore},
    layer::{Field, FieldType, Layer, RasterLayer, Schema, Value, VectorLayer},
    output::{assemble, ContributionRecord, ResultKind, ZoneResult},
    stats::{aggregate_raster, aggregate_vector, check_agreement, PortableZonalStats, ScanlineZonalStats, ZonalStatistics},
    zone::ZoneModel,
};

/// Name of the assembled output layer.
const OUTPUT_LAYER: &str = "aggregation";

/// Contribution key for the attributed value when no distinct value field exists.
const VALUE_KEY: &str = "value";

/// Explicit configuration and state of one aggregation run.
pub struct AggregationContext<'a> {
    extent: Rect<f64>,
    zone_layer: Option<&'a VectorLayer>,
    hazard: Option<&'a Layer>,
    exposure: Option<&'a Layer>,
    keywords: &'a dyn KeywordStore,
    config: AggregationConfig,
    native: Box<dyn ZonalStatistics + 'a>,
    attributes: AHashMap<String, Option<String>>,
    zones: ZoneModel,
    zone_problem: Option<String>,
    validated: bool,
    layer: Option<VectorLayer>,
    results: Vec<ZoneResult>,
    contributions: Vec<Vec<ContributionRecord>>,
    preprocessed_feature_count: usize,
    value_field: Option<String>,
}

impl<'a> AggregationContext<'a> {
    /// Build a context over `extent`. Without a zone layer the run is in AOI
    /// mode with a single "Entire area" zone.
    ///
    /// Zone layer problems (non-polygon or invalid geometry) are reported by
    /// `validate_keywords`.
    pub fn new(
        extent: Rect<f64>,
        zone_layer: Option<&'a VectorLayer>,
        keywords: &'a dyn KeywordStore,
        config: AggregationConfig,
    ) -> Self {
        let mut attributes = AHashMap::new();
        let mut zone_problem = None;

        let mut zones = match zone_layer {
            None => ZoneModel::entire_area(extent),
            Some(layer) => {
                let label = resolve_label_attribute(layer, keywords);
                attributes.insert(keys::AGGREGATION_ATTRIBUTE.to_string(), label.clone());
                ZoneModel::from_layer(layer, label).unwrap_or_else(|err| {
                    warn!(layer = layer.name(), error = %err, "zone layer is unusable");
                    zone_problem = Some(err.to_string());
                    ZoneModel::empty()
                })
            }
        };
        if zone_layer.is_none() {
            attributes.insert(keys::AGGREGATION_ATTRIBUTE.to_string(), zones.label_attribute().map(str::to_string));
        }
        prepare_zones(&mut zones, &extent);

        Self {
            extent,
            zone_layer,
            hazard: None,
            exposure: None,
            keywords,
            config,
            native: Box::new(ScanlineZonalStats),
            attributes,
            zones,
            zone_problem,
            validated: false,
            layer: None,
            results: Vec::new(),
            contributions: Vec::new(),
            preprocessed_feature_count: 0,
            value_field: None,
        }
    }

    /// Extent from `[xmin, ymin, xmax, ymax]`.
    pub fn extent_from_array(extent: [f64; 4]) -> Rect<f64> {
        Rect::new(Coord { x: extent[0], y: extent[1] }, Coord { x: extent[2], y: extent[3] })
    }

    /// Replace the native raster backend with a host-provided routine.
    pub fn with_native_backend(mut self, backend: impl ZonalStatistics + 'a) -> Self {
        self.native = Box::new(backend);
        self
    }

    /// Register the hazard and exposure layers of the run.
    pub fn set_layers(&mut self, hazard: &'a Layer, exposure: &'a Layer) {
        self.hazard = Some(hazard);
        self.exposure = Some(exposure);
        self.validated = false;
    }

    #[inline] pub fn hazard_layer(&self) -> Option<&'a Layer> { self.hazard }

    #[inline] pub fn exposure_layer(&self) -> Option<&'a Layer> { self.exposure }

    #[inline] pub fn extent(&self) -> Rect<f64> { self.extent }

    #[inline] pub fn config(&self) -> &AggregationConfig { &self.config }

    /// Select the native (true) or portable (false) raster strategy.
    pub fn use_native_zonal_stats(&mut self, native: bool) {
        self.config.strategy = if native { ZonalStrategy::Native } else { ZonalStrategy::Portable };
    }

    #[inline] pub fn sum_field_name(&self) -> &str { &self.config.sum_field }

    pub fn set_sum_field_name(&mut self, name: impl Into<String>) {
        self.config.sum_field = name.into();
    }

    /// Resolved attribute map (`attribute key -> field name or null`).
    #[inline] pub fn attributes(&self) -> &AHashMap<String, Option<String>> { &self.attributes }

    #[inline]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|name| name.as_deref())
    }

    #[inline] pub fn zones(&self) -> &ZoneModel { &self.zones }

    /// Output layer of the last `aggregate` call.
    #[inline] pub fn layer(&self) -> Option<&VectorLayer> { self.layer.as_ref() }

    #[inline] pub fn results(&self) -> &[ZoneResult] { &self.results }

    /// Contribution records of the last vector aggregation, grouped by zone.
    #[inline] pub fn impact_layer_attributes(&self) -> &[Vec<ContributionRecord>] { &self.contributions }

    #[inline] pub fn preprocessed_feature_count(&self) -> usize { self.preprocessed_feature_count }

    /// Contribution records as JSON maps keyed by the run's field names.
    pub fn impact_layer_attributes_json(&self) -> Vec<Vec<JsonValue>> {
        let value_key = match self.value_field.as_deref() {
            Some(name) if name != self.sum_field_name() => name,
            _ => VALUE_KEY,
        };
        self.contributions.iter()
            .map(|zone| zone.iter()
                .map(|record| record.to_json(self.zones.label_field(), value_key, self.sum_field_name()))
                .collect())
            .collect()
    }

    /// Check that the run is fully configured before `aggregate`.
    pub fn validate_keywords(&mut self) -> Result<()> {
        let (Some(hazard), Some(exposure)) = (self.hazard, self.exposure) else {
            return Err(Error::KeywordsNotValid("hazard and exposure layers must be set with set_layers".into()));
        };

        let (min, max) = (self.extent.min(), self.extent.max());
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite())
            || self.extent.width() <= 0.0 || self.extent.height() <= 0.0
        {
            return Err(Error::Configuration(format!("degenerate extent {:?}", self.extent)));
        }

        if let Some(problem) = &self.zone_problem {
            return Err(Error::KeywordsNotValid(format!("zone layer has no usable geometry: {problem}")));
        }

        if let Some(zone_layer) = self.zone_layer {
            match keyword(self.keywords, zone_layer.name(), keys::CATEGORY) {
                Keyword::Text(category) if category == keys::AGGREGATION_CATEGORY => {}
                Keyword::Text(category) => return Err(Error::KeywordsNotValid(format!(
                    "zone layer '{}' has category '{category}', expected '{}'",
                    zone_layer.name(), keys::AGGREGATION_CATEGORY
                ))),
                Keyword::Null | Keyword::Absent => return Err(Error::KeywordsNotValid(format!(
                    "zone layer '{}' has no '{}' keyword", zone_layer.name(), keys::CATEGORY
                ))),
            }
        }

        let mut epsg = None;
        let declared = [hazard.epsg(), exposure.epsg(), self.zone_layer.and_then(VectorLayer::epsg)];
        for code in declared.into_iter().flatten() {
            match epsg {
                None => epsg = Some(code),
                Some(first) if first != code => return Err(Error::Configuration(format!(
                    "layers declare different CRS (EPSG:{first} and EPSG:{code})"
                ))),
                Some(_) => {}
            }
        }

        self.validated = true;
        debug!(zones = self.zones.len(), aoi = self.zones.is_aoi(), label = ?self.zones.label_attribute(), "keywords validated");
        Ok(())
    }

    /// Designated value field of `layer`: the `target_field` keyword, else the
    /// configured default.
    pub fn target_field(&self, layer: &VectorLayer) -> Option<String> {
        match keyword(self.keywords, layer.name(), keys::TARGET_FIELD) {
            Keyword::Text(name) => Some(name.to_string()),
            Keyword::Null => None,
            Keyword::Absent => self.config.value_field.clone(),
        }
    }

    /// True for a vector layer carrying a numeric or boolean value field, or a
    /// count and sum field pair.
    pub fn has_required_target_fields(&self, layer: &Layer) -> bool {
        let Some(vector) = layer.as_vector() else { return false; };
        let numeric = |name: &str| vector.schema().field(name).is_some_and(|field| field.ty.is_summable());

        self.target_field(vector).is_some_and(|name| numeric(&name))
            || (numeric(COUNT_FIELD) && numeric(self.sum_field_name()))
    }

    /// Raster backend selected by the current strategy.
    pub fn backend(&self) -> &dyn ZonalStatistics {
        match self.config.strategy {
            ZonalStrategy::Native => self.native.as_ref(),
            ZonalStrategy::Portable => &PortableZonalStats,
        }
    }

    /// Run both raster strategies on `raster` and fail if they disagree.
    pub fn check_strategy_agreement(&self, raster: &RasterLayer) -> Result<()> {
        let native = aggregate_raster(raster, &self.zones, self.native.as_ref());
        let portable = aggregate_raster(raster, &self.zones, &PortableZonalStats);
        check_agreement(&native, &portable, self.config.strategy_tolerance)
    }

    /// Aggregate `impact` into the zones, replacing any previous results.
    pub fn aggregate(&mut self, impact: &Layer) -> Result<()> {
        if !self.validated {
            return Err(Error::Configuration("validate_keywords must succeed before aggregate".into()));
        }

        match impact {
            Layer::Raster(raster) => self.aggregate_raster_layer(raster)?,
            Layer::Vector(vector) => self.aggregate_vector_layer(impact, vector)?,
        }

        info!(
            impact = impact.name(),
            zones = self.results.len(),
            fragments = self.preprocessed_feature_count,
            "aggregation complete"
        );
        Ok(())
    }

    fn aggregate_raster_layer(&mut self, raster: &RasterLayer) -> Result<()> {
        if raster.is_empty() || raster.valid_cell_count() == 0 {
            return Err(Error::Aggregation(format!("raster '{}' has no valid cells", raster.name())));
        }
        if self.config.verify_strategies {
            self.check_strategy_agreement(raster)?;
        }

        let results = aggregate_raster(raster, &self.zones, self.backend());
        self.layer = Some(assemble(&self.zones, &results, self.sum_field_name(), ResultKind::Raster, OUTPUT_LAYER)?);
        self.results = results;
        self.contributions.clear();
        self.preprocessed_feature_count = 0;
        self.value_field = None;
        Ok(())
    }

    fn aggregate_vector_layer(&mut self, impact: &Layer, vector: &VectorLayer) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::Aggregation(format!("impact layer '{}' has no features", vector.name())));
        }
        if !self.has_required_target_fields(impact) {
            return Err(Error::Aggregation(format!(
                "impact layer '{}' has neither a numeric target field nor '{}' and '{}' fields",
                vector.name(), COUNT_FIELD, self.sum_field_name()
            )));
        }

        let value_field = self.target_field(vector)
            .filter(|name| vector.schema().contains(name))
            .unwrap_or_else(|| self.sum_field_name().to_string());
        let value_idx = vector.schema().index_of(&value_field);

        let aggregation = aggregate_vector(vector, &self.zones, value_idx, &self.config)?;
        self.layer = Some(assemble(&self.zones, &aggregation.results, self.sum_field_name(), ResultKind::Vector, OUTPUT_LAYER)?);
        self.preprocessed_feature_count = aggregation.fragment_count();
        self.results = aggregation.results;
        self.contributions = aggregation.contributions;
        self.value_field = Some(value_field);
        Ok(())
    }

    /// Split every feature of `layer` into per-zone fragments.
    ///
    /// Fragments keep the source attributes and id and gain the zone label
    /// field. Sets `preprocessed_feature_count`.
    pub fn preprocess(&mut self, layer: &VectorLayer) -> Result<VectorLayer> {
        let label_field = self.zones.label_field().to_string();
        if layer.schema().contains(&label_field) {
            return Err(Error::Configuration(format!(
                "layer '{}' already has a '{label_field}' field", layer.name()
            )));
        }

        let mut fields = layer.schema().fields().to_vec();
        fields.push(Field::new(label_field, FieldType::Text));
        let mut output = VectorLayer::new(layer.name(), Schema::new(fields));
        if let Some(epsg) = layer.epsg() {
            output = output.with_epsg(epsg);
        }

        for feature in layer.features() {
            let shape = Shape::from_geometry(&feature.geometry, Some(feature.fid))?;
            if shape.is_degenerate() {
                continue;
            }
            for fragment in fragments(&shape, &self.zones, self.config.polygon_membership) {
                let mut values = feature.values.clone();
                values.push(Value::Text(self.zones.display_label(fragment.zone)));
                output.push(feature.fid, fragment.shape.into_geometry(), values);
            }
        }

        self.preprocessed_feature_count = output.len();
        debug!(layer = layer.name(), features = layer.len(), fragments = output.len(), "preprocessed layer");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::keywords::Keywords;

    fn districts() -> VectorLayer {
        let mut layer = VectorLayer::new("districts", Schema::new(vec![Field::new("KAB_NAME", FieldType::Text)]));
        layer.push(0, polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)], vec!["WEST".into()]);
        layer.push(1, polygon![(x: 2.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 2.0), (x: 2.0, y: 2.0)], vec!["EAST".into()]);
        layer
    }

    fn hazard() -> Layer {
        VectorLayer::new("hazard", Schema::default()).into()
    }

    fn extent() -> Rect<f64> {
        AggregationContext::extent_from_array([0.0, 0.0, 4.0, 2.0])
    }

    #[test]
    fn sum_field_name_defaults_and_renames() {
        let keywords = Keywords::new();
        let mut context = AggregationContext::new(extent(), None, &keywords, AggregationConfig::default());
        assert_eq!(context.sum_field_name(), "aggr_sum");
        context.set_sum_field_name("SUMM_AGGR");
        assert_eq!(context.sum_field_name(), "SUMM_AGGR");
    }

    #[test]
    fn validate_requires_layers() {
        let keywords = Keywords::new();
        let mut context = AggregationContext::new(extent(), None, &keywords, AggregationConfig::default());
        assert!(matches!(context.validate_keywords(), Err(Error::KeywordsNotValid(_))));
    }

    #[test]
    fn validate_requires_aggregation_category() {
        let zones = districts();
        let (h, e) = (hazard(), hazard());

        let keywords = Keywords::new();
        let mut context = AggregationContext::new(extent(), Some(&zones), &keywords, AggregationConfig::default());
        context.set_layers(&h, &e);
        assert!(matches!(context.validate_keywords(), Err(Error::KeywordsNotValid(_))));

        let keywords = Keywords::new().with("districts", keys::CATEGORY, "aggregation");
        let mut context = AggregationContext::new(extent(), Some(&zones), &keywords, AggregationConfig::default());
        context.set_layers(&h, &e);
        assert!(context.validate_keywords().is_ok());
        assert_eq!(context.attribute(keys::AGGREGATION_ATTRIBUTE), Some("KAB_NAME"));
    }

    #[test]
    fn validate_rejects_degenerate_extent_and_crs_mismatch() {
        let keywords = Keywords::new();
        let (h, e) = (hazard(), hazard());
        let mut context = AggregationContext::new(
            AggregationContext::extent_from_array([1.0, 1.0, 1.0, 3.0]), None, &keywords, AggregationConfig::default(),
        );
        context.set_layers(&h, &e);
        assert!(matches!(context.validate_keywords(), Err(Error::Configuration(_))));

        let h: Layer = VectorLayer::new("hazard", Schema::default()).with_epsg(4326).into();
        let e: Layer = VectorLayer::new("exposure", Schema::default()).with_epsg(32748).into();
        let mut context = AggregationContext::new(extent(), None, &keywords, AggregationConfig::default());
        context.set_layers(&h, &e);
        assert!(matches!(context.validate_keywords(), Err(Error::Configuration(_))));
    }

    #[test]
    fn aggregate_before_validation_fails() {
        let keywords = Keywords::new();
        let mut context = AggregationContext::new(extent(), None, &keywords, AggregationConfig::default());
        assert!(matches!(context.aggregate(&hazard()), Err(Error::Configuration(_))));
    }

    #[test]
    fn target_fields_gate_aggregation() {
        let zones = districts();
        let keywords = Keywords::new().with("roads", keys::TARGET_FIELD, "flooded");
        let context = AggregationContext::new(extent(), Some(&zones), &keywords, AggregationConfig::default());

        assert!(!context.has_required_target_fields(&zones.clone().into()));

        let roads = VectorLayer::new("roads", Schema::new(vec![Field::new("flooded", FieldType::Integer)]));
        assert!(context.has_required_target_fields(&roads.into()));

        let roads = VectorLayer::new("roads", Schema::new(vec![Field::new("flooded", FieldType::Text)]));
        assert!(!context.has_required_target_fields(&roads.into()));

        let table = VectorLayer::new("table", Schema::new(vec![
            Field::new("count", FieldType::Integer),
            Field::new("aggr_sum", FieldType::Float),
        ]));
        assert!(context.has_required_target_fields(&table.into()));
    }

    #[test]
    fn aoi_extent_matches_layer_extent() {
        let (h, e) = (hazard(), hazard());
        let mut impact = VectorLayer::new("impact", Schema::new(vec![Field::new("value", FieldType::Float)]));
        impact.push(0, polygon![(x: 1.0, y: 0.5), (x: 2.0, y: 0.5), (x: 2.0, y: 1.5)], vec![Value::Null]);
        let keywords = Keywords::new().with("impact", keys::TARGET_FIELD, "value");
        let mut context = AggregationContext::new(extent(), None, &keywords, AggregationConfig::default());
        context.set_layers(&h, &e);
        context.validate_keywords().unwrap();
        context.aggregate(&impact.into()).unwrap();

        assert_eq!(context.layer().and_then(VectorLayer::extent), Some(extent()));
    }

    #[test]
    fn boolean_target_field_sums_as_flag() {
        let zones = districts();
        let (h, e) = (hazard(), hazard());
        let keywords = Keywords::new()
            .with("districts", keys::CATEGORY, "aggregation")
            .with("roads", keys::TARGET_FIELD, "flooded");
        let mut roads = VectorLayer::new("roads", Schema::new(vec![Field::new("flooded", FieldType::Bool)]));
        roads.push(0, polygon![(x: 0.5, y: 0.5), (x: 1.5, y: 0.5), (x: 1.5, y: 1.5), (x: 0.5, y: 1.5)], vec![true.into()]);
        roads.push(1, polygon![(x: 2.5, y: 0.5), (x: 3.5, y: 0.5), (x: 3.5, y: 1.5), (x: 2.5, y: 1.5)], vec![false.into()]);
        let roads: Layer = roads.into();

        let mut context = AggregationContext::new(extent(), Some(&zones), &keywords, AggregationConfig::default());
        assert!(context.has_required_target_fields(&roads));
        context.set_layers(&h, &e);
        context.validate_keywords().unwrap();
        context.aggregate(&roads).unwrap();

        let results = context.results();
        assert_eq!((results[0].count, results[0].sum), (1, 1.0));
        assert_eq!((results[1].count, results[1].sum), (1, 0.0));
    }

    #[test]
    fn raster_run_resets_fragment_count() {
        let zones = districts();
        let (h, e) = (hazard(), hazard());
        let keywords = Keywords::new()
            .with("districts", keys::CATEGORY, "aggregation")
            .with("impact", keys::TARGET_FIELD, "value");
        let mut impact = VectorLayer::new("impact", Schema::new(vec![Field::new("value", FieldType::Float)]));
        impact.push(0, polygon![(x: 1.0, y: 0.5), (x: 3.0, y: 0.5), (x: 3.0, y: 1.5), (x: 1.0, y: 1.5)], vec![2.0.into()]);

        let mut context = AggregationContext::new(extent(), Some(&zones), &keywords, AggregationConfig::default());
        context.set_layers(&h, &e);
        context.validate_keywords().unwrap();
        context.aggregate(&impact.into()).unwrap();
        assert_eq!(context.preprocessed_feature_count(), 2);

        let raster = RasterLayer::new("hazard", ndarray::Array2::ones((2, 4)), Coord { x: 0.0, y: 2.0 }, 1.0, 1.0).unwrap();
        context.aggregate(&raster.into()).unwrap();
        assert_eq!(context.preprocessed_feature_count(), 0);
        assert!(context.impact_layer_attributes().is_empty());
    }
}
