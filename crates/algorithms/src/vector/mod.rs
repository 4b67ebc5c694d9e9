//! Vector operations
//!
//! Geometry support for the extractors and the clearance evaluator:
//! - Polygonize: 4-connected mask components to polygons
//! - Rasterize: polygons back to masks (pixel-center rule)
//! - Buffer: point circles and segment capsules
//! - Route: arc-length sampling of a polyline

mod buffer;
mod polygonize;
mod rasterize;
mod route;

pub use buffer::{buffer_point, buffer_segment, BufferParams};
pub use polygonize::{label_components, polygonize, Region};
pub use rasterize::rasterize;
pub use route::sample_route;
