use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Intersects, MultiPoint, MultiPolygon, Rect,
};
use tracing::debug;

use crate::{
    config::PolygonMembership,
    geom::{planar_length, Shape},
    zone::ZoneModel,
};

/// Fragments whose measure falls below this share of the source measure are
/// treated as boundary noise from the clipper.
const SLIVER_RATIO: f64 = 1e-9;

/// The part of one input geometry that falls inside one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub zone: usize,
    pub shape: Shape,
    /// Clipped length for lines, clipped area for polygons, zero for points.
    pub measure: f64,
}

/// Clip every zone boundary to `extent`.
///
/// Zones left empty stay in the model (and in the results) but drop out of
/// the candidate index.
pub fn prepare_zones(model: &mut ZoneModel, extent: &Rect<f64>) {
    let clip = MultiPolygon(vec![extent.to_polygon()]);
    let mut clipped = 0;

    for zone in 0..model.len() {
        let boundary = model.zones()[zone].boundary();
        match boundary.bounding_rect() {
            Some(bbox) if covers(extent, &bbox) => continue,
            None => continue,
            Some(_) => {}
        }
        let inside = boundary.intersection(&clip);
        model.set_boundary(zone, inside);
        clipped += 1;
    }

    model.rebuild_index();
    debug!(zones = model.len(), clipped, "prepared zones against extent");
}

/// Split `shape` into one fragment per zone it overlaps, in zone order.
///
/// Polygons need a positive-area intersection and lines a positive-length
/// clip; points count for every zone that contains or touches them.
pub fn split(shape: &Shape, model: &ZoneModel) -> Vec<Fragment> {
    let Some(bbox) = shape.bounding_rect() else { return Vec::new(); };
    let total = shape.measure();

    model.candidates(&bbox).into_iter()
        .filter_map(|zone| {
            let boundary = model.zones()[zone].boundary();
            match shape {
                Shape::Polygons(mp) => {
                    let piece = boundary.intersection(mp);
                    let area = piece.unsigned_area();
                    (area > SLIVER_RATIO * total)
                        .then(|| Fragment { zone, shape: Shape::Polygons(piece), measure: area })
                }
                Shape::Lines(mls) => {
                    let piece = boundary.clip(mls, false);
                    let length = planar_length(&piece);
                    (length > SLIVER_RATIO * total)
                        .then(|| Fragment { zone, shape: Shape::Lines(piece), measure: length })
                }
                Shape::Points(mp) => {
                    let hits = mp.iter().filter(|p| boundary.intersects(*p)).copied().collect::<Vec<_>>();
                    (!hits.is_empty())
                        .then(|| Fragment { zone, shape: Shape::Points(MultiPoint(hits)), measure: 0.0 })
                }
            }
        })
        .collect()
}

/// Fragments of `shape` under the model's mode and the polygon membership rule.
///
/// In AOI mode a shape touching the single zone contributes whole. With
/// centroid membership a polygon goes undivided to the first zone holding
/// its centroid.
pub fn fragments(shape: &Shape, model: &ZoneModel, membership: PolygonMembership) -> Vec<Fragment> {
    if model.is_aoi() {
        return model.zones().iter()
            .filter(|zone| !zone.is_empty() && intersects(zone.boundary(), shape))
            .map(|zone| Fragment { zone: zone.id(), shape: shape.clone(), measure: shape.measure() })
            .collect();
    }

    match (shape, membership) {
        (Shape::Polygons(mp), PolygonMembership::Centroid) => {
            let Some(center) = mp.centroid() else { return Vec::new(); };
            model.candidates(&Rect::new(center.0, center.0)).into_iter()
                .find(|&zone| model.zones()[zone].boundary().intersects(&center))
                .map(|zone| Fragment { zone, shape: shape.clone(), measure: shape.measure() })
                .into_iter()
                .collect()
        }
        _ => split(shape, model),
    }
}

fn covers(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x && outer.min().y <= inner.min().y
        && inner.max().x <= outer.max().x && inner.max().y <= outer.max().y
}

fn intersects(boundary: &MultiPolygon<f64>, shape: &Shape) -> bool {
    match shape {
        Shape::Points(mp) => mp.iter().any(|p| boundary.intersects(p)),
        Shape::Lines(mls) => mls.iter().any(|ls| boundary.intersects(ls)),
        Shape::Polygons(mp) => mp.iter().any(|p| boundary.intersects(p)),
    }
}
