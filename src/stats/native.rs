use geo::{BoundingRect, MultiPolygon};

use crate::{
    layer::RasterLayer,
    stats::{row_crossing, zone_edges, ZonalStatistics, ZoneStats},
};

/// Scanline fill: for every cell row, the ring crossings at the row centre
/// are paired into spans (even-odd rule) and the cells between them summed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanlineZonalStats;

impl ZonalStatistics for ScanlineZonalStats {
    fn name(&self) -> &str { "native" }

    fn zonal_stats(&self, raster: &RasterLayer, zone: &MultiPolygon<f64>) -> ZoneStats {
        let mut stats = ZoneStats::default();
        let Some(bbox) = zone.bounding_rect() else { return stats; };

        let edges = zone_edges(zone);

        let mut crossings = Vec::with_capacity(8);
        for row in raster.rows_between(bbox.min().y, bbox.max().y) {
            let y = raster.center_y(row);

            crossings.clear();
            crossings.extend(edges.iter().filter_map(|(a, b)| row_crossing(a, b, y)));
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                for col in raster.cols_in_span(span[0], span[1]) {
                    if let Some(value) = raster.value(row, col) {
                        stats.add(value);
                    }
                }
            }
        }
        stats
    }
}
