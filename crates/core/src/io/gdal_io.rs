//! GeoTIFF reading through GDAL
//!
//! Enables formats beyond plain TIFF and true windowed reads, so an area of
//! interest never loads the full grid. Writing always goes through the
//! native encoder.

use crate::crs::CRS;
use crate::error::Result;
use crate::raster::{GeoTransform, Raster, RasterElement, Window};
use gdal::raster::GdalType;
use gdal::Dataset;
use std::path::Path;

/// Read band 1 of a raster dataset into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement + GdalType + Copy,
    P: AsRef<Path>,
{
    let dataset = Dataset::open(path.as_ref())?;
    let (cols, rows) = dataset.raster_size();
    read_window(&dataset, &Window::full(rows, cols))
}

/// Read only the pixels covering world `bounds` (min_x, min_y, max_x, max_y)
pub fn read_geotiff_bounds<T, P>(path: P, bounds: (f64, f64, f64, f64)) -> Result<Raster<T>>
where
    T: RasterElement + GdalType + Copy,
    P: AsRef<Path>,
{
    let dataset = Dataset::open(path.as_ref())?;
    let (cols, rows) = dataset.raster_size();
    let transform = dataset
        .geo_transform()
        .map(GeoTransform::from_gdal)
        .unwrap_or_default();
    let window = Window::from_bounds(bounds, &transform, rows, cols)?;
    read_window(&dataset, &window)
}

/// Spatial reference of a dataset without reading any band
pub fn read_geotiff_crs<P: AsRef<Path>>(path: P) -> Result<Option<CRS>> {
    let dataset = Dataset::open(path.as_ref())?;
    Ok(dataset.spatial_ref().ok().and_then(|srs| srs_to_crs(&srs)))
}

fn srs_to_crs(srs: &gdal::spatial_ref::SpatialRef) -> Option<CRS> {
    match srs.auth_code() {
        Ok(code) => Some(CRS::from_epsg(code as u32)),
        Err(_) => srs.to_wkt().ok().map(CRS::from_wkt),
    }
}

fn read_window<T>(dataset: &Dataset, window: &Window) -> Result<Raster<T>>
where
    T: RasterElement + GdalType + Copy,
{
    let band = dataset.rasterband(1)?;
    let size = (window.width, window.height);
    let buffer = band.read_as::<T>(
        (window.col_off as isize, window.row_off as isize),
        size,
        size,
        None,
    )?;

    let mut raster = Raster::from_vec(buffer.data().to_vec(), window.height, window.width)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(window.transform(&GeoTransform::from_gdal(gt)));
    }

    if let Ok(srs) = dataset.spatial_ref() {
        raster.set_crs(srs_to_crs(&srs));
    }

    if let Some(nodata) = band.no_data_value() {
        raster.set_nodata(Some(T::from_f64(nodata)));
    }

    Ok(raster)
}
