//! I/O operations for reading and writing elevation rasters

#[cfg(feature = "gdal")]
mod gdal_io;
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, read_geotiff_bounds, read_geotiff_crs};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, read_geotiff_bounds, read_geotiff_crs};

pub use native::{read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
