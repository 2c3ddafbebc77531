mod raster;
mod value;
mod vector;

pub use raster::RasterLayer;
pub use value::{Field, FieldType, Schema, Value};
pub use vector::{Feature, VectorLayer};

use geo::Rect;

/// A layer handed over by the host: either a cell grid or a feature set.
#[derive(Debug, Clone)]
pub enum Layer {
    Raster(RasterLayer),
    Vector(VectorLayer),
}

impl Layer {
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Layer::Raster(raster) => raster.name(),
            Layer::Vector(vector) => vector.name(),
        }
    }

    #[inline]
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Layer::Raster(raster) => raster.epsg(),
            Layer::Vector(vector) => vector.epsg(),
        }
    }

    pub fn extent(&self) -> Option<Rect<f64>> {
        match self {
            Layer::Raster(raster) => Some(raster.extent()),
            Layer::Vector(vector) => vector.extent(),
        }
    }

    #[inline] pub fn is_vector(&self) -> bool { matches!(self, Layer::Vector(_)) }

    #[inline]
    pub fn as_vector(&self) -> Option<&VectorLayer> {
        match self {
            Layer::Vector(vector) => Some(vector),
            Layer::Raster(_) => None,
        }
    }

    #[inline]
    pub fn as_raster(&self) -> Option<&RasterLayer> {
        match self {
            Layer::Raster(raster) => Some(raster),
            Layer::Vector(_) => None,
        }
    }
}

impl From<RasterLayer> for Layer {
    fn from(raster: RasterLayer) -> Self { Layer::Raster(raster) }
}

impl From<VectorLayer> for Layer {
    fn from(vector: VectorLayer) -> Self { Layer::Vector(vector) }
}
