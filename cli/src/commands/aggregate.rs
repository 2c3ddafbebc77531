use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use zonal::{io, Layer};

use crate::commands::ZoneInputs;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::AggregateArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./aggregation.csv"));

    info!("[aggregate] loading impact layer from {}", args.impact.display());
    let impact = io::read_layer(&args.impact)?;
    let hazard = match &args.hazard {
        Some(path) => Some(io::read_layer(path)?),
        None => None,
    };
    let exposure = match &args.exposure {
        Some(path) => Some(io::read_layer(path)?),
        None => None,
    };

    let inputs = ZoneInputs::load(&args.zone)?;
    let mut context = inputs.context(&args.zone, &impact)?;
    if args.native {
        context.use_native_zonal_stats(true);
    }
    if let Some(name) = &args.sum_field {
        context.set_sum_field_name(name.clone());
    }

    context.set_layers(hazard.as_ref().unwrap_or(&impact), exposure.as_ref().unwrap_or(&impact));
    context.validate_keywords()?;

    info!("[aggregate] aggregating into {} zones", context.zones().len());
    context.aggregate(&impact)?;

    let Some(layer) = context.layer() else {
        anyhow::bail!("[aggregate] Aggregation produced no output layer");
    };

    info!("[aggregate] writing zone table to {}", out_path.display());
    io::write_zone_table(layer, &out_path)?;

    if let Some(path) = &args.geojson {
        info!("[aggregate] writing zone layer to {}", path.display());
        io::write_geojson(layer, path)?;
    }

    if let Some(path) = &args.contributions {
        if matches!(impact, Layer::Raster(_)) {
            info!("[aggregate] raster aggregation has no contribution records");
        }
        let json = serde_json::to_string_pretty(&context.impact_layer_attributes_json())
            .context("[aggregate] Failed to serialize contribution records")?;
        fs::write(path, json)
            .with_context(|| format!("[aggregate] Failed to write contributions to {}", path.display()))?;
    }

    Ok(())
}

