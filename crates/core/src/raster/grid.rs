//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement, Window};
use ndarray::{s, Array2, ArrayView2};

/// A georeferenced 2D raster grid.
///
/// Cells are stored row-major as `(row, col)`. The grid owns its data: every
/// engine call reads the rasters it needs into fresh `Raster` values and
/// drops them when the call returns.
///
/// # Example
///
/// ```
/// use tengri_core::{GeoTransform, Raster};
///
/// let mut dem: Raster<f64> = Raster::filled(50, 50, 100.0)
///     .with_transform(GeoTransform::new(0.0, 1500.0, 30.0, -30.0));
/// dem.set(10, 20, 105.0).unwrap();
/// assert_eq!(dem.get(10, 20).unwrap(), 105.0);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Builder: set the geotransform
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder: set the CRS
    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Builder: set the no-data sentinel
    pub fn with_nodata(mut self, nodata: T) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// New raster on the same grid (transform and CRS) holding `data`
    pub fn with_same_grid<U: RasterElement>(&self, data: Array2<U>) -> Result<Raster<U>> {
        if data.dim() != self.shape() {
            let (er, ec) = self.shape();
            let (ar, ac) = data.dim();
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(Raster {
            data,
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        })
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the declared no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Absolute pixel size `(x, y)` in CRS units
    pub fn pixel_size(&self) -> (f64, f64) {
        self.transform.pixel_size()
    }

    /// World bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Whether `other` has the same dimensions and transform
    pub fn same_grid<U: RasterElement>(&self, other: &Raster<U>) -> bool {
        self.shape() == other.shape() && self.transform == other.transform
    }

    // Coordinate conversion

    /// Convert pixel coordinates to world coordinates (pixel center)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Convert world coordinates to fractional pixel coordinates
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    // Windows

    /// Copy the cells under `window` into a new raster with the window's transform
    pub fn subset(&self, window: &Window) -> Result<Self> {
        let (rows, cols) = self.shape();
        if window.is_empty() || window.row_end() > rows || window.col_end() > cols {
            return Err(Error::EmptyWindow(format!(
                "{window:?} does not fit a {rows}x{cols} raster"
            )));
        }

        let data = self
            .data
            .slice(s![window.row_off..window.row_end(), window.col_off..window.col_end()])
            .to_owned();

        Ok(Self {
            data,
            transform: window.transform(&self.transform),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    // Statistics

    /// Calculate basic statistics over valid cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for v in self
            .data
            .iter()
            .filter(|v| !self.is_nodata(**v))
            .filter_map(|v| v.to_f64())
        {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }

        let (min, max, mean) = if count > 0 {
            (Some(min), Some(max), Some(sum / count as f64))
        } else {
            (None, None, None)
        };

        RasterStatistics {
            min,
            max,
            mean,
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

impl Raster<f64> {
    /// Replace every no-data cell with NaN.
    ///
    /// The declared sentinel is kept as metadata so that subsets written back
    /// to disk still carry it. Returns the number of invalid cells.
    pub fn normalize_nodata(&mut self) -> usize {
        let nodata = self.nodata;
        let mut invalid = 0;
        for v in self.data.iter_mut() {
            if v.is_nodata(nodata) || !v.is_finite() {
                *v = f64::NAN;
                invalid += 1;
            }
        }
        invalid
    }

    /// Owned copy with no-data normalized to NaN
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize_nodata();
        copy
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.set(10, 0, 1.0).is_err());
    }

    #[test]
    fn test_normalize_nodata() {
        let mut raster = Raster::filled(4, 4, 100.0).with_nodata(-9999.0);
        raster.set(1, 1, -9999.0).unwrap();
        raster.set(2, 2, f64::INFINITY).unwrap();

        assert_eq!(raster.normalize_nodata(), 2);
        assert!(raster.get(1, 1).unwrap().is_nan());
        assert!(raster.get(2, 2).unwrap().is_nan());
        assert_eq!(raster.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_subset_carries_transform() {
        let mut raster = Raster::filled(20, 20, 0.0)
            .with_transform(GeoTransform::new(0.0, 600.0, 30.0, -30.0))
            .with_crs(CRS::from_epsg(32636));
        raster.set(5, 6, 7.0).unwrap();

        let sub = raster.subset(&Window::new(4, 3, 5, 5)).unwrap();
        assert_eq!(sub.shape(), (5, 5));
        assert_eq!(sub.get(2, 2).unwrap(), 7.0);
        assert_eq!(sub.transform().origin_x, 120.0);
        assert_eq!(sub.transform().origin_y, 510.0);
        assert_eq!(sub.crs().and_then(CRS::epsg), Some(32636));

        assert!(raster.subset(&Window::new(18, 18, 5, 5)).is_err());
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster = Raster::new(10, 10).with_nodata(-1.0);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }
        raster.set(0, 1, -1.0).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nodata_count, 1);
    }
}
