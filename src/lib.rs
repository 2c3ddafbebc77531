#![doc = "Zonal aggregation of impact results"]
mod aggregator;
mod config;
mod error;
mod geom;
mod keywords;
mod layer;
mod output;
mod stats;
mod zone;

pub mod io;

#[doc(inline)]
pub use aggregator::AggregationContext;

#[doc(inline)]
pub use config::{
    keys, AggregationConfig, LineWeighting, PolygonMembership, ZonalStrategy,
    AOI_LABEL_FIELD, COUNT_FIELD, DEFAULT_SUM_FIELD, DENSITY_FIELD, ENTIRE_AREA, POSITIONAL_LABEL_FIELD,
};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use geom::{centroid, centroids, fragments, planar_length, prepare_zones, split, Fragment, GeometryKind, Shape};

#[doc(inline)]
pub use keywords::{keyword, label_candidates, resolve_label_attribute, Keyword, KeywordStore, Keywords};

#[doc(inline)]
pub use layer::{Feature, Field, FieldType, Layer, RasterLayer, Schema, Value, VectorLayer};

#[doc(inline)]
pub use output::{assemble, ContributionRecord, ResultKind, ZoneResult};

#[doc(inline)]
pub use stats::{
    aggregate_raster, aggregate_vector, attributed_value, check_agreement,
    PortableZonalStats, ScanlineZonalStats, VectorAggregation, ZonalStatistics, ZoneStats,
};

#[doc(inline)]
pub use zone::{Zone, ZoneModel};
