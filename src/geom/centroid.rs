use geo::{Centroid, Coord, LineString, Point, Polygon};

use crate::error::{Error, Result};

/// Centroid of a simple polygon given as its ring of vertices.
/// The ring may be open or closed; three distinct vertices are enough.
pub fn centroid(ring: &[Coord<f64>]) -> Result<Point<f64>> {
    if ring.iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
        return Err(Error::geometry(None, "non-finite coordinate in centroid ring"));
    }

    Polygon::new(LineString::from(ring.to_vec()), vec![])
        .centroid()
        .ok_or_else(|| Error::geometry(None, "cannot take the centroid of an empty ring"))
}

/// One centroid per input ring, in input order.
pub fn centroids(rings: &[Vec<Coord<f64>>]) -> Result<Vec<Point<f64>>> {
    rings.iter().map(|ring| centroid(ring)).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    #[test]
    fn minimal_closed_triangles() {
        let polygon1 = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let polygon2 = ring(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);

        let both = centroids(&[polygon1.clone(), polygon2]).unwrap();
        assert_eq!(both.len(), 2);
        assert!((both[0].x() - 1.0 / 3.0).abs() < 1e-12);
        assert!((both[0].y() - 1.0 / 3.0).abs() < 1e-12);
        assert!((both[1].x() - 2.0 / 3.0).abs() < 1e-12);
        assert!((both[1].y() - 1.0 / 3.0).abs() < 1e-12);

        let one = centroids(&[polygon1]).unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn open_ring_matches_closed_ring() {
        let open = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)]);
        let mut closed = open.clone();
        closed.push(open[0]);
        assert_eq!(centroid(&open).unwrap(), centroid(&closed).unwrap());
        assert_eq!(centroid(&open).unwrap(), Point::new(2.0, 1.0));
    }

    #[test]
    fn empty_ring_is_an_error() {
        assert!(centroid(&[]).is_err());
        assert!(centroids(&[vec![]]).is_err());
    }

    #[test]
    fn empty_batch_yields_no_centroids() {
        assert!(centroids(&[]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn one_centroid_per_ring_in_order(offsets in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 0..16)) {
            let rings = offsets.iter()
                .map(|&(dx, dy)| ring(&[(dx, dy), (dx + 2.0, dy), (dx + 2.0, dy + 2.0), (dx, dy + 2.0), (dx, dy)]))
                .collect::<Vec<_>>();
            let points = centroids(&rings).unwrap();

            prop_assert_eq!(points.len(), rings.len());
            for (point, &(dx, dy)) in points.iter().zip(&offsets) {
                prop_assert!((point.x() - (dx + 1.0)).abs() < 1e-9);
                prop_assert!((point.y() - (dy + 1.0)).abs() < 1e-9);
            }
        }
    }
}
