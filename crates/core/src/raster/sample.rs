//! Point sampling and grid-to-grid resampling

use crate::raster::{Raster, RasterElement};
use ndarray::Array2;

/// Value of the cell containing world point `(x, y)`.
///
/// The floor index is clamped into the grid, so points just past the edge
/// read the edge cell. No-data cells yield NaN, as does an empty raster or a
/// degenerate transform.
pub fn sample_nearest<T: RasterElement>(raster: &Raster<T>, x: f64, y: f64) -> f64 {
    let (rows, cols) = raster.shape();
    if rows == 0 || cols == 0 {
        return f64::NAN;
    }
    let Some((row, col)) = raster.transform().index(x, y) else {
        return f64::NAN;
    };
    let row = row.clamp(0, rows as isize - 1) as usize;
    let col = col.clamp(0, cols as isize - 1) as usize;
    cell_value(raster, row, col)
}

/// Bilinear interpolation between the four pixel centers around `(x, y)`.
///
/// Invalid corners are dropped and the remaining weights renormalized;
/// NaN only when all four are invalid.
pub fn sample_bilinear<T: RasterElement>(raster: &Raster<T>, x: f64, y: f64) -> f64 {
    let (rows, cols) = raster.shape();
    if rows == 0 || cols == 0 {
        return f64::NAN;
    }
    let (col_f, row_f) = raster.geo_to_pixel(x, y);
    if !col_f.is_finite() || !row_f.is_finite() {
        return f64::NAN;
    }

    // Pixel centers sit at +0.5
    let cf = (col_f - 0.5).clamp(0.0, (cols - 1) as f64);
    let rf = (row_f - 0.5).clamp(0.0, (rows - 1) as f64);
    let c0 = cf.floor() as usize;
    let r0 = rf.floor() as usize;
    let c1 = (c0 + 1).min(cols - 1);
    let r1 = (r0 + 1).min(rows - 1);
    let tx = cf - c0 as f64;
    let ty = rf - r0 as f64;

    let corners = [
        (r0, c0, (1.0 - tx) * (1.0 - ty)),
        (r0, c1, tx * (1.0 - ty)),
        (r1, c0, (1.0 - tx) * ty),
        (r1, c1, tx * ty),
    ];

    let mut sum = 0.0;
    let mut weight = 0.0;
    for &(r, c, w) in &corners {
        let v = cell_value(raster, r, c);
        if v.is_finite() && w > 0.0 {
            sum += v * w;
            weight += w;
        }
    }

    if weight > 0.0 {
        sum / weight
    } else {
        // Point exactly on an invalid pixel center, or every corner invalid
        cell_value(raster, r0, c0)
    }
}

/// Resample `source` onto the grid of `target` with bilinear interpolation.
///
/// The result carries the target's transform and CRS; cells whose centers
/// fall outside the source extent are NaN.
pub fn resample_bilinear<T: RasterElement, U: RasterElement>(
    source: &Raster<T>,
    target: &Raster<U>,
) -> Raster<f64> {
    let (rows, cols) = target.shape();
    let (min_x, min_y, max_x, max_y) = source.bounds();

    let data = Array2::from_shape_fn((rows, cols), |(row, col)| {
        let (x, y) = target.pixel_to_geo(col, row);
        if x < min_x || x > max_x || y < min_y || y > max_y {
            f64::NAN
        } else {
            sample_bilinear(source, x, y)
        }
    });

    let mut out = Raster::from_array(data).with_transform(*target.transform());
    out.set_crs(target.crs().cloned());
    out
}

fn cell_value<T: RasterElement>(raster: &Raster<T>, row: usize, col: usize) -> f64 {
    match raster.data().get((row, col)) {
        Some(v) if !raster.is_nodata(*v) => v.to_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;
    use approx::assert_relative_eq;

    fn ramp() -> Raster<f64> {
        // value = col, 10 m pixels, origin (0, 100)
        let data = Array2::from_shape_fn((10, 10), |(_, c)| c as f64);
        Raster::from_array(data).with_transform(GeoTransform::new(0.0, 100.0, 10.0, -10.0))
    }

    #[test]
    fn nearest_reads_containing_cell() {
        let r = ramp();
        assert_eq!(sample_nearest(&r, 35.0, 55.0), 3.0);
        // past the right edge clamps to the last column
        assert_eq!(sample_nearest(&r, 250.0, 55.0), 9.0);
    }

    #[test]
    fn nearest_nodata_is_nan() {
        let mut r = ramp().with_nodata(-9999.0);
        r.set(4, 3, -9999.0).unwrap();
        assert!(sample_nearest(&r, 35.0, 55.0).is_nan());
    }

    #[test]
    fn bilinear_interpolates_between_centers() {
        let r = ramp();
        // x = 40 lies halfway between centers of col 3 (35) and col 4 (45)
        assert_relative_eq!(sample_bilinear(&r, 40.0, 55.0), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn resample_onto_finer_grid() {
        let src = ramp();
        let fine: Raster<f64> =
            Raster::new(20, 20).with_transform(GeoTransform::new(0.0, 100.0, 5.0, -5.0));
        let out = resample_bilinear(&src, &fine);
        assert_eq!(out.shape(), (20, 20));
        assert!(out.same_grid(&fine));
        // center of fine col 7 is x = 37.5 -> 3.25 on the ramp
        assert_relative_eq!(out.get(3, 7).unwrap(), 3.25, epsilon = 1e-12);
    }
}
