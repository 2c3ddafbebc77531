use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point};

use crate::{
    layer::RasterLayer,
    stats::{in_row_span, zone_edges, ZonalStatistics, ZoneStats},
};

/// Per-cell point-in-polygon test over the zone's bounding window.
/// Centres on the boundary follow the row-span rule of the scanline fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableZonalStats;

impl ZonalStatistics for PortableZonalStats {
    fn name(&self) -> &str { "portable" }

    fn zonal_stats(&self, raster: &RasterLayer, zone: &MultiPolygon<f64>) -> ZoneStats {
        let mut stats = ZoneStats::default();
        let Some(bbox) = zone.bounding_rect() else { return stats; };

        let edges = zone_edges(zone);
        let cols = raster.cols_between(bbox.min().x, bbox.max().x);
        for row in raster.rows_between(bbox.min().y, bbox.max().y) {
            let y = raster.center_y(row);
            for col in cols.clone() {
                let Some(value) = raster.value(row, col) else { continue; };
                let x = raster.center_x(col);
                let centre = Point::new(x, y);
                if zone.contains(&centre) || (zone.intersects(&centre) && in_row_span(&edges, x, y)) {
                    stats.add(value);
                }
            }
        }
        stats
    }
}
