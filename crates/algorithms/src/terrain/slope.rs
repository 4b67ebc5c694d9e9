//! Slope in degrees from a central-difference gradient
//!
//! Interior cells use `(z[i+1] - z[i-1]) / 2h`; the first and last cell of
//! each axis fall back to one-sided differences. Rows are spaced by the
//! pixel height and columns by the pixel width, each in metres.

use crate::maybe_rayon::map_rows;
use tengri_core::raster::Raster;
use tengri_core::{Algorithm, Error, Result};

/// Parameters for slope calculation
#[derive(Debug, Clone, Copy, Default)]
pub struct SlopeParams {
    /// Ground spacing `(x, y)` in metres. `None` uses the raster's pixel
    /// size, which is only right for projected rasters.
    pub spacing: Option<(f64, f64)>,
}

/// Slope algorithm
#[derive(Debug, Clone, Default)]
pub struct Slope;

impl Algorithm for Slope {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = SlopeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Slope"
    }

    fn description(&self) -> &'static str {
        "Slope in degrees from central differences with per-axis spacing"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        slope(&input, params)
    }
}

/// Calculate slope in degrees.
///
/// Cells whose value or any difference partner is no-data come out NaN.
pub fn slope(dem: &Raster<f64>, params: SlopeParams) -> Result<Raster<f64>> {
    let (dx, dy) = params.spacing.unwrap_or_else(|| dem.pixel_size());
    for (name, h) in [("spacing_x", dx), ("spacing_y", dy)] {
        if !(h.is_finite() && h > 0.0) {
            return Err(Error::invalid_parameter(name, h, "pixel spacing must be positive"));
        }
    }

    let (rows, cols) = dem.shape();
    let z = dem.normalized().into_array();

    let data = map_rows(rows, cols, |row, out| {
        for (col, cell) in out.iter_mut().enumerate() {
            if z[(row, col)].is_nan() {
                continue;
            }
            let gx = derivative(cols, col, dx, |c| z[(row, c)]);
            let gy = derivative(rows, row, dy, |r| z[(r, col)]);
            *cell = (gx * gx + gy * gy).sqrt().atan().to_degrees();
        }
    });

    let mut out = dem.with_same_grid(data)?;
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

/// Gradient along one axis at index `i` of a line of length `n`
fn derivative(n: usize, i: usize, h: f64, at: impl Fn(usize) -> f64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    if i == 0 {
        (at(1) - at(0)) / h
    } else if i == n - 1 {
        (at(n - 1) - at(n - 2)) / h
    } else {
        (at(i + 1) - at(i - 1)) / (2.0 * h)
    }
}
