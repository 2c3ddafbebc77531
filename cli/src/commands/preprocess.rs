use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::info;
use zonal::{io, Layer};

use crate::commands::ZoneInputs;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::PreprocessArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./preprocessed.geojson"));

    info!("[preprocess] loading layer from {}", args.input.display());
    let input = io::read_layer(&args.input)?;
    let Layer::Vector(vector) = &input else {
        bail!("[preprocess] Only vector layers can be split: {}", args.input.display());
    };

    let inputs = ZoneInputs::load(&args.zone)?;
    let mut context = inputs.context(&args.zone, &input)?;
    let fragments = context.preprocess(vector)?;

    info!(
        "[preprocess] {} features split into {} fragments",
        vector.len(),
        context.preprocessed_feature_count()
    );
    io::write_geojson(&fragments, &out_path)
}
