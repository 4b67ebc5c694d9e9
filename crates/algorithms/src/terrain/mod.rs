//! Terrain analysis algorithms
//!
//! - Slope: central-difference gradient in degrees
//! - Smoothing: no-data aware Gaussian filter
//! - Ground: bare-ground approximation from a surface model

mod ground;
mod slope;
mod smoothing;

pub use ground::{derive_ground, DeriveGround, GroundMethod, GroundParams};
pub use slope::{slope, Slope, SlopeParams};
pub use smoothing::{gaussian_blur, gaussian_smoothing, GaussianParams, GaussianSmoothing};
