use tracing::debug;

use crate::{
    error::{Error, Result},
    layer::RasterLayer,
    output::ZoneResult,
    stats::{ZonalStatistics, ZoneStats},
    zone::ZoneModel,
};

/// Per-zone count, sum and density of the valid raster cells inside each zone.
/// Empty zones yield zeros.
pub fn aggregate_raster(raster: &RasterLayer, model: &ZoneModel, backend: &dyn ZonalStatistics) -> Vec<ZoneResult> {
    let results = model.zones().iter()
        .map(|zone| {
            let stats = if zone.is_empty() {
                ZoneStats::default()
            } else {
                backend.zonal_stats(raster, zone.boundary())
            };
            ZoneResult::raster(zone.id(), model.display_label(zone.id()), stats)
        })
        .collect::<Vec<_>>();

    debug!(raster = raster.name(), backend = backend.name(), zones = results.len(), "aggregated raster");
    results
}

/// Compare two sets of raster results: counts must match exactly, sums and
/// densities within `tolerance` relative difference.
pub fn check_agreement(a: &[ZoneResult], b: &[ZoneResult], tolerance: f64) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::Aggregation(format!(
            "strategies returned {} and {} zones", a.len(), b.len()
        )));
    }

    for (x, y) in a.iter().zip(b) {
        if x.count != y.count {
            return Err(Error::Aggregation(format!(
                "zone '{}': cell counts differ ({} vs {})", x.label, x.count, y.count
            )));
        }
        if !within(x.sum, y.sum, tolerance) {
            return Err(Error::Aggregation(format!(
                "zone '{}': sums differ ({} vs {})", x.label, x.sum, y.sum
            )));
        }
        let (dx, dy) = (x.density.unwrap_or(0.0), y.density.unwrap_or(0.0));
        if !within(dx, dy, tolerance) {
            return Err(Error::Aggregation(format!(
                "zone '{}': densities differ ({dx} vs {dy})", x.label
            )));
        }
    }
    Ok(())
}

#[inline]
fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}
