mod native;
mod portable;
mod raster;
mod vector;

pub use native::ScanlineZonalStats;
pub use portable::PortableZonalStats;
pub use raster::{aggregate_raster, check_agreement};
pub use vector::{aggregate_vector, attributed_value, VectorAggregation};

use geo::{Coord, MultiPolygon};

use crate::layer::RasterLayer;

/// Ring edges of a zone boundary, holes included, without horizontal edges.
pub(crate) fn zone_edges(zone: &MultiPolygon<f64>) -> Vec<(Coord<f64>, Coord<f64>)> {
    zone.iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.lines())
        .map(|line| (line.start, line.end))
        .filter(|(a, b)| a.y != b.y)
        .collect()
}

/// Where edge `a`-`b` crosses the row at `y`.
///
/// Edges are half-open in y: the lower end crosses, the upper end does not.
#[inline]
pub(crate) fn row_crossing(a: &Coord<f64>, b: &Coord<f64>, y: f64) -> Option<f64> {
    ((a.y <= y) != (b.y <= y)).then(|| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
}

/// Even-odd test of a cell centre against the row crossings, with the span
/// `[x0, x1)` closed on the left. A centre on a boundary shared by two zones
/// falls in exactly one of them.
#[inline]
pub(crate) fn in_row_span(edges: &[(Coord<f64>, Coord<f64>)], x: f64, y: f64) -> bool {
    edges.iter()
        .filter_map(|(a, b)| row_crossing(a, b, y))
        .filter(|&crossing| crossing <= x)
        .count() % 2 == 1
}

/// Count and sum of the values assigned to one zone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneStats {
    pub count: u64,
    pub sum: f64,
}

impl ZoneStats {
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// Mean value, or 0 when nothing was counted.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }
}

/// A raster zonal-statistics routine over a single zone boundary.
///
/// Cells are assigned by their centre; a centre on the boundary counts when
/// it opens a row span (left or bottom edge). No-data and NaN cells are skipped.
pub trait ZonalStatistics {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    fn zonal_stats(&self, raster: &RasterLayer, zone: &MultiPolygon<f64>) -> ZoneStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_stats_is_zero() {
        assert_eq!(ZoneStats::default().mean(), 0.0);
    }

    #[test]
    fn add_accumulates() {
        let mut stats = ZoneStats::default();
        stats.add(2.0);
        stats.add(4.0);
        assert_eq!(stats, ZoneStats { count: 2, sum: 6.0 });
        assert_eq!(stats.mean(), 3.0);
    }
}
