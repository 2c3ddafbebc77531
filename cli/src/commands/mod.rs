pub mod aggregate;
pub mod preprocess;

use anyhow::{ensure, Context, Result};
use zonal::{io, AggregationConfig, AggregationContext, Keywords, Layer, VectorLayer};

use crate::cli::ZoneArgs;

/// Inputs loaded from the shared zone arguments.
pub struct ZoneInputs {
    pub zones: Option<VectorLayer>,
    pub keywords: Keywords,
    pub config: AggregationConfig,
}

impl ZoneInputs {
    pub fn load(args: &ZoneArgs) -> Result<Self> {
        let zones = match &args.zones {
            Some(path) => match io::read_layer(path)? {
                Layer::Vector(layer) => Some(layer),
                Layer::Raster(_) => anyhow::bail!("[commands::load] Zone layer must be a vector layer: {}", path.display()),
            },
            None => None,
        };
        let keywords = match &args.keywords {
            Some(path) => Keywords::from_json_file(path)?,
            None => Keywords::new(),
        };
        let config = match &args.config {
            Some(path) => AggregationConfig::from_json_file(path)?,
            None => AggregationConfig::default(),
        };
        Ok(Self { zones, keywords, config })
    }

    /// Context over the requested extent, else the zone extent, else `fallback`'s extent.
    pub fn context<'a>(&'a self, args: &ZoneArgs, fallback: &Layer) -> Result<AggregationContext<'a>> {
        let extent = match &args.extent {
            Some(values) => {
                ensure!(values.len() == 4, "[commands::context] --extent takes xmin,ymin,xmax,ymax");
                AggregationContext::extent_from_array([values[0], values[1], values[2], values[3]])
            }
            None => self.zones.as_ref()
                .and_then(VectorLayer::extent)
                .or_else(|| fallback.extent())
                .context("[commands::context] Cannot derive an extent; pass --extent")?,
        };
        Ok(AggregationContext::new(extent, self.zones.as_ref(), &self.keywords, self.config.clone()))
    }
}
