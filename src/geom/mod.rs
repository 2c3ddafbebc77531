mod centroid;
mod overlay;
mod shape;

pub use centroid::{centroid, centroids};
pub use overlay::{fragments, prepare_zones, split, Fragment};
pub use shape::{planar_length, GeometryKind, Shape};
