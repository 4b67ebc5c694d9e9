//! Mathematical morphology
//!
//! - **Binary**: erosion, dilation, opening and closing on boolean masks,
//!   used to refine flat and obstacle masks
//! - **Grey**: minimum / maximum filters and opening on rasters, used to
//!   derive a ground model from a surface model

mod binary;
mod element;
mod grey;

pub use binary::{binary_closing, binary_dilate, binary_erode, binary_opening, Morphology};
pub use element::StructuringElement;
pub use grey::{dilate, erode, opening, GreyParams, Opening};
