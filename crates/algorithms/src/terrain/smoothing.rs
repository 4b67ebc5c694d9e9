//! Gaussian smoothing that ignores no-data cells
//!
//! Separable kernel truncated at `round(4σ)` cells. Each pass renormalizes
//! by the weight of the valid cells it actually touched, so holes and raster
//! borders do not drag values toward zero. No-data cells stay no-data.

use crate::maybe_rayon::map_rows;
use ndarray::Array2;
use tengri_core::raster::Raster;
use tengri_core::{Algorithm, Error, Result};

/// Parameters for Gaussian smoothing
#[derive(Debug, Clone, Copy)]
pub struct GaussianParams {
    /// Standard deviation in cells; `<= 0` returns the input unchanged
    pub sigma: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

/// Gaussian smoothing algorithm
#[derive(Debug, Clone, Default)]
pub struct GaussianSmoothing;

impl Algorithm for GaussianSmoothing {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = GaussianParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "GaussianSmoothing"
    }

    fn description(&self) -> &'static str {
        "Separable no-data aware Gaussian filter"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        gaussian_smoothing(&input, params)
    }
}

/// Smooth a raster with a Gaussian of `params.sigma` cells
pub fn gaussian_smoothing(raster: &Raster<f64>, params: GaussianParams) -> Result<Raster<f64>> {
    if params.sigma.is_nan() {
        return Err(Error::invalid_parameter("sigma", params.sigma, "must be a number"));
    }
    let data = gaussian_blur(&raster.normalized().into_array(), params.sigma);
    let mut out = raster.with_same_grid(data)?;
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

/// Blur a NaN-normalized grid; `sigma <= 0` returns a copy
pub fn gaussian_blur(data: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if sigma.is_nan() || sigma <= 0.0 {
        return data.clone();
    }

    let kernel = kernel_1d(sigma);
    let radius = (kernel.len() / 2) as isize;
    let (rows, cols) = data.dim();

    let horizontal = map_rows(rows, cols, |row, out| {
        for (col, cell) in out.iter_mut().enumerate() {
            if data[(row, col)].is_nan() {
                continue;
            }
            *cell = weighted(&kernel, radius, col, cols, |c| data[(row, c)]);
        }
    });

    map_rows(rows, cols, |row, out| {
        for (col, cell) in out.iter_mut().enumerate() {
            if horizontal[(row, col)].is_nan() {
                continue;
            }
            *cell = weighted(&kernel, radius, row, rows, |r| horizontal[(r, col)]);
        }
    })
}

fn kernel_1d(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as isize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    (-radius..=radius)
        .map(|d| (-((d * d) as f64) / two_sigma_sq).exp())
        .collect()
}

fn weighted(kernel: &[f64], radius: isize, center: usize, len: usize, at: impl Fn(usize) -> f64) -> f64 {
    let mut sum = 0.0;
    let mut wsum = 0.0;
    for (k, w) in kernel.iter().enumerate() {
        let i = center as isize + k as isize - radius;
        if i < 0 || i >= len as isize {
            continue;
        }
        let v = at(i as usize);
        if v.is_nan() {
            continue;
        }
        sum += v * w;
        wsum += w;
    }
    if wsum > 0.0 {
        sum / wsum
    } else {
        f64::NAN
    }
}
