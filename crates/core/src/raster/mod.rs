//! Raster data structures and operations

mod element;
mod geotransform;
mod grid;
mod neighborhood;
mod sample;
mod window;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use neighborhood::Neighborhood;
pub use sample::{resample_bilinear, sample_bilinear, sample_nearest};
pub use window::Window;
