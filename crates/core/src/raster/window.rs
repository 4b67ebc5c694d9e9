//! Pixel windows for area-of-interest reads

use crate::error::{Error, Result};
use crate::raster::GeoTransform;

/// A rectangular block of whole pixels inside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(col_off: usize, row_off: usize, width: usize, height: usize) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Window covering a whole `rows x cols` raster
    pub fn full(rows: usize, cols: usize) -> Self {
        Self::new(0, 0, cols, rows)
    }

    /// Window of cells `[row - half_rows, row + half_rows)` by
    /// `[col - half_cols, col + half_cols)`, clipped to the raster.
    ///
    /// The center may lie outside the raster; the result is then empty or
    /// thin, which callers treat as an undersized window.
    pub fn around(
        row: isize,
        col: isize,
        half_rows: usize,
        half_cols: usize,
        rows: usize,
        cols: usize,
    ) -> Self {
        let clip = |center: isize, half: usize, len: usize| -> (usize, usize) {
            let lo = (center - half as isize).clamp(0, len as isize) as usize;
            let hi = (center + half as isize).clamp(0, len as isize) as usize;
            (lo, hi.max(lo))
        };
        let (r0, r1) = clip(row, half_rows, rows);
        let (c0, c1) = clip(col, half_cols, cols);
        Self::new(c0, r0, c1 - c0, r1 - r0)
    }

    /// Window covering world `bounds` (min_x, min_y, max_x, max_y).
    ///
    /// Fractional offsets and sizes are rounded to whole pixels with a 1x1
    /// floor, then clipped to the raster. A window that ends up with no
    /// pixels inside the raster is an [`Error::EmptyWindow`].
    pub fn from_bounds(
        bounds: (f64, f64, f64, f64),
        transform: &GeoTransform,
        rows: usize,
        cols: usize,
    ) -> Result<Self> {
        let (min_x, min_y, max_x, max_y) = bounds;
        let corners = [
            transform.geo_to_pixel(min_x, min_y),
            transform.geo_to_pixel(min_x, max_y),
            transform.geo_to_pixel(max_x, min_y),
            transform.geo_to_pixel(max_x, max_y),
        ];
        if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
            return Err(Error::EmptyWindow(format!("non-finite bounds {bounds:?}")));
        }

        let col_min = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let col_max = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let row_min = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let row_max = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let col_off = col_min.round() as i64;
        let row_off = row_min.round() as i64;
        let width = ((col_max - col_min).round() as i64).max(1);
        let height = ((row_max - row_min).round() as i64).max(1);

        let c0 = col_off.clamp(0, cols as i64);
        let c1 = (col_off + width).clamp(0, cols as i64);
        let r0 = row_off.clamp(0, rows as i64);
        let r1 = (row_off + height).clamp(0, rows as i64);

        if c1 <= c0 || r1 <= r0 {
            return Err(Error::EmptyWindow(format!(
                "bounds {bounds:?} fall outside the {rows}x{cols} raster"
            )));
        }

        Ok(Self::new(
            c0 as usize,
            r0 as usize,
            (c1 - c0) as usize,
            (r1 - r0) as usize,
        ))
    }

    /// Exclusive end row
    pub fn row_end(&self) -> usize {
        self.row_off + self.height
    }

    /// Exclusive end column
    pub fn col_end(&self) -> usize {
        self.col_off + self.width
    }

    /// `(rows, cols)` of the window
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geotransform of the window's top-left pixel
    pub fn transform(&self, parent: &GeoTransform) -> GeoTransform {
        parent.window_transform(self.col_off, self.row_off)
    }
}
