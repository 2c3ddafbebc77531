//! Aggregation run configuration.
//!
//! Built once per analysis run and passed by reference into the
//! `AggregationContext`; there is no process-wide state.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default output field name for the per-zone sum.
pub const DEFAULT_SUM_FIELD: &str = "aggr_sum";

/// Output field name for the per-zone fragment/cell count.
pub const COUNT_FIELD: &str = "count";

/// Output field name for the raster density (sum / cell count).
pub const DENSITY_FIELD: &str = "density";

/// Label given to the single synthetic zone in AOI mode.
pub const ENTIRE_AREA: &str = "Entire area";

/// Label field of the synthetic AOI zone layer.
pub const AOI_LABEL_FIELD: &str = "area";

/// Label field used when no label attribute could be resolved.
pub const POSITIONAL_LABEL_FIELD: &str = "zone_id";

/// Keyword keys understood by the resolver.
pub mod keys {
    pub const CATEGORY: &str = "category";
    pub const AGGREGATION_ATTRIBUTE: &str = "aggregation attribute";
    pub const TARGET_FIELD: &str = "target_field";

    /// Required value of `category` on a zone layer.
    pub const AGGREGATION_CATEGORY: &str = "aggregation";
}

/// Which raster statistics implementation `aggregate` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZonalStrategy {
    /// Host-optimized backend (scanline fill unless the host injects one).
    Native,
    /// Direct per-cell point-in-polygon evaluation.
    #[default]
    Portable,
}

/// How a line fragment's value is derived when its feature carries a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineWeighting {
    /// `value * clipped_length / total_length`.
    #[default]
    Fraction,
    /// Clipped length when the value is non-zero, otherwise 0.
    FlaggedLength,
}

/// Which zones a polygon feature contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolygonMembership {
    /// Every zone the polygon overlaps with positive area.
    #[default]
    Intersects,
    /// Only the first zone (in zone order) containing the polygon centroid.
    Centroid,
}

/// Configuration for a single aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Output field name for the sum statistic.
    pub sum_field: String,

    /// Raster statistics strategy.
    pub strategy: ZonalStrategy,

    /// Value attribute used when the impact layer has no `target_field` keyword.
    pub value_field: Option<String>,

    pub line_weighting: LineWeighting,

    pub polygon_membership: PolygonMembership,

    /// Run both raster strategies and fail when they disagree.
    pub verify_strategies: bool,

    /// Relative tolerance used by the strategy agreement check.
    pub strategy_tolerance: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            sum_field: DEFAULT_SUM_FIELD.to_string(),
            strategy: ZonalStrategy::default(),
            value_field: None,
            line_weighting: LineWeighting::default(),
            polygon_membership: PolygonMembership::default(),
            verify_strategies: false,
            strategy_tolerance: 0.01,
        }
    }
}

impl AggregationConfig {
    /// Read a config from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[AggregationConfig.from_json_file] Failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[AggregationConfig.from_json_file] Invalid config in {}", path.display()))
    }

    pub fn with_sum_field(mut self, name: impl Into<String>) -> Self {
        self.sum_field = name.into();
        self
    }

    pub fn with_strategy(mut self, strategy: ZonalStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_value_field(mut self, name: impl Into<String>) -> Self {
        self.value_field = Some(name.into());
        self
    }

    pub fn with_line_weighting(mut self, weighting: LineWeighting) -> Self {
        self.line_weighting = weighting;
        self
    }

    pub fn with_polygon_membership(mut self, membership: PolygonMembership) -> Self {
        self.polygon_membership = membership;
        self
    }

    pub fn with_verify_strategies(mut self, verify: bool) -> Self {
        self.verify_strategies = verify;
        self
    }
}
