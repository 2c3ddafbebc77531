use std::{fs, path::Path};

use anyhow::{anyhow, bail, ensure, Context, Result};
use geo::Coord;
use ndarray::Array2;

use crate::{io::layer_name, layer::RasterLayer};

/// Read an ESRI ASCII grid (`.asc`) into a raster layer named after the file.
pub fn read_ascii_grid(path: &Path) -> Result<RasterLayer> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("[io::grid::read_ascii_grid] Failed to read {}", path.display()))?;
    parse_ascii_grid(&layer_name(path), &text)
        .with_context(|| format!("[io::grid::read_ascii_grid] Invalid grid in {}", path.display()))
}

/// Parse ESRI ASCII grid text. Both corner and centre registration are accepted.
pub fn parse_ascii_grid(name: &str, text: &str) -> Result<RasterLayer> {
    let mut tokens = text.split_whitespace().peekable();

    let (mut ncols, mut nrows) = (None, None);
    let (mut x, mut y, mut centered) = (None, None, false);
    let (mut cell, mut dx, mut dy, mut nodata) = (None, None, None, None);

    while let Some(key) = tokens.next_if(|t| t.starts_with(|c: char| c.is_ascii_alphabetic())) {
        let value = tokens.next()
            .ok_or_else(|| anyhow!("[io::grid::parse_ascii_grid] Missing value for '{key}'"))?;
        let number = || value.parse::<f64>()
            .with_context(|| format!("[io::grid::parse_ascii_grid] Invalid value '{value}' for '{key}'"));
        match key.to_ascii_lowercase().as_str() {
            "ncols" => ncols = Some(number()? as usize),
            "nrows" => nrows = Some(number()? as usize),
            "xllcorner" => x = Some(number()?),
            "yllcorner" => y = Some(number()?),
            "xllcenter" => { x = Some(number()?); centered = true; }
            "yllcenter" => { y = Some(number()?); centered = true; }
            "cellsize" => cell = Some(number()?),
            "dx" => dx = Some(number()?),
            "dy" => dy = Some(number()?),
            "nodata_value" => nodata = Some(number()?),
            other => bail!("[io::grid::parse_ascii_grid] Unknown header '{other}'"),
        }
    }

    let missing = |what: &str| anyhow!("[io::grid::parse_ascii_grid] Missing '{what}' header");
    let (ncols, nrows) = (ncols.ok_or_else(|| missing("ncols"))?, nrows.ok_or_else(|| missing("nrows"))?);
    let (x, y) = (x.ok_or_else(|| missing("xllcorner"))?, y.ok_or_else(|| missing("yllcorner"))?);
    let width = dx.or(cell).ok_or_else(|| missing("cellsize"))?;
    let height = dy.or(cell).ok_or_else(|| missing("cellsize"))?;

    let values = tokens
        .map(|t| t.parse::<f64>().with_context(|| format!("[io::grid::parse_ascii_grid] Invalid cell value '{t}'")))
        .collect::<Result<Vec<_>>>()?;
    ensure!(
        values.len() == nrows * ncols,
        "[io::grid::parse_ascii_grid] Expected {} cells, found {}", nrows * ncols, values.len()
    );

    let (left, bottom) = if centered { (x - width / 2.0, y - height / 2.0) } else { (x, y) };
    let origin = Coord { x: left, y: bottom + nrows as f64 * height };
    let data = Array2::from_shape_vec((nrows, ncols), values)
        .context("[io::grid::parse_ascii_grid] Cell grid has the wrong shape")?;

    let raster = RasterLayer::new(name, data, origin, width, height)?;
    Ok(match nodata {
        Some(value) => raster.with_nodata(value),
        None => raster,
    })
}
