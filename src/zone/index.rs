use geo::Rect;
use rstar::{RTreeObject, AABB};

/// The envelope of a zone boundary in the R-tree, associated with the zone by index.
#[derive(Debug, Clone)]
pub(super) struct ZoneEnvelope {
    zone: usize, // Index of the zone in model order
    bbox: Rect<f64>,
}

impl ZoneEnvelope {
    pub(super) fn new(zone: usize, bbox: Rect<f64>) -> Self {
        Self { zone, bbox }
    }

    /// Get the index of the corresponding zone.
    pub(super) fn zone(&self) -> usize { self.zone }
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Convert a rectangle into an R-tree query envelope.
#[inline]
pub(super) fn envelope_of(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}
