use std::ops::Range;

use geo::{Coord, Rect};
use ndarray::Array2;

use crate::error::{Error, Result};

/// A north-up grid of numeric cells.
///
/// `data[[row, col]]` is stored top row first; `origin` is the top-left
/// corner of the grid.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    name: String,
    data: Array2<f64>,
    origin: Coord<f64>,
    cell_width: f64,
    cell_height: f64,
    nodata: Option<f64>,
    epsg: Option<u32>,
}

impl RasterLayer {
    /// Construct a raster from a cell grid, its top-left corner and cell size.
    pub fn new(name: impl Into<String>, data: Array2<f64>, origin: Coord<f64>, cell_width: f64, cell_height: f64) -> Result<Self> {
        if !(cell_width.is_finite() && cell_width > 0.0 && cell_height.is_finite() && cell_height > 0.0) {
            return Err(Error::Aggregation(format!(
                "raster cell size must be positive and finite, got {cell_width} x {cell_height}"
            )));
        }
        if !(origin.x.is_finite() && origin.y.is_finite()) {
            return Err(Error::Aggregation("raster origin must be finite".into()));
        }

        Ok(Self { name: name.into(), data, origin, cell_width, cell_height, nodata: None, epsg: None })
    }

    /// Mark `value` as the no-data sentinel.
    pub fn with_nodata(mut self, value: f64) -> Self {
        self.nodata = Some(value);
        self
    }

    pub fn with_epsg(mut self, epsg: u32) -> Self {
        self.epsg = Some(epsg);
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    #[inline] pub fn rows(&self) -> usize { self.data.nrows() }

    #[inline] pub fn cols(&self) -> usize { self.data.ncols() }

    #[inline] pub fn is_empty(&self) -> bool { self.data.is_empty() }

    #[inline] pub fn nodata(&self) -> Option<f64> { self.nodata }

    #[inline] pub fn cell_size(&self) -> (f64, f64) { (self.cell_width, self.cell_height) }

    #[inline] pub fn data(&self) -> &Array2<f64> { &self.data }

    /// Spatial extent covered by the grid.
    pub fn extent(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.origin.x, y: self.origin.y - self.rows() as f64 * self.cell_height },
            Coord { x: self.origin.x + self.cols() as f64 * self.cell_width, y: self.origin.y },
        )
    }

    #[inline] pub fn center_x(&self, col: usize) -> f64 { self.origin.x + (col as f64 + 0.5) * self.cell_width }

    #[inline] pub fn center_y(&self, row: usize) -> f64 { self.origin.y - (row as f64 + 0.5) * self.cell_height }

    /// Cell value, or `None` for no-data and NaN cells.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        let v = self.data[[row, col]];
        if v.is_nan() || self.nodata == Some(v) { None } else { Some(v) }
    }

    /// Rows whose cell centre lies in `[min_y, max_y]`.
    pub fn rows_between(&self, min_y: f64, max_y: f64) -> Range<usize> {
        let start = ((self.origin.y - max_y) / self.cell_height - 0.5).ceil();
        let end = ((self.origin.y - min_y) / self.cell_height - 0.5).floor() + 1.0;
        clamp_range(start, end, self.rows())
    }

    /// Columns whose cell centre lies in `[min_x, max_x]`.
    pub fn cols_between(&self, min_x: f64, max_x: f64) -> Range<usize> {
        let start = ((min_x - self.origin.x) / self.cell_width - 0.5).ceil();
        let end = ((max_x - self.origin.x) / self.cell_width - 0.5).floor() + 1.0;
        clamp_range(start, end, self.cols())
    }

    /// Columns whose cell centre lies in the half-open span `[x0, x1)`.
    pub fn cols_in_span(&self, x0: f64, x1: f64) -> Range<usize> {
        let start = ((x0 - self.origin.x) / self.cell_width - 0.5).ceil();
        let end = ((x1 - self.origin.x) / self.cell_width - 0.5).ceil();
        clamp_range(start, end, self.cols())
    }

    /// Number of cells that are neither no-data nor NaN.
    pub fn valid_cell_count(&self) -> usize {
        self.data.iter()
            .filter(|v| !v.is_nan() && self.nodata != Some(**v))
            .count()
    }
}

fn clamp_range(start: f64, end: f64, len: usize) -> Range<usize> {
    let start = start.max(0.0).min(len as f64) as usize;
    let end = end.max(0.0).min(len as f64) as usize;
    start..end.max(start)
}
