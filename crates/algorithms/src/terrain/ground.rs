//! Bare-ground approximation from a surface model
//!
//! A grey opening (or plain minimum filter) with a square window wider than
//! buildings and tree crowns flattens them onto the surrounding terrain; a
//! light Gaussian then removes the blocky texture the filter leaves behind.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tengri_core::raster::Raster;
use tengri_core::{Algorithm, Error, Result};
use tracing::debug;

use super::smoothing::{gaussian_smoothing, GaussianParams};
use crate::morphology::{erode, opening, StructuringElement};

/// Filter used to suppress above-ground objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundMethod {
    /// Grey opening: keeps terrain shape, removes narrow bumps
    #[default]
    Opening,
    /// Minimum filter: lower everywhere by up to the window relief
    Minimum,
}

impl FromStr for GroundMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "opening" => Ok(GroundMethod::Opening),
            "min" | "minimum" => Ok(GroundMethod::Minimum),
            other => Err(Error::invalid_parameter("method", other, "expected 'open' or 'min'")),
        }
    }
}

/// Parameters for ground derivation
#[derive(Debug, Clone, Copy)]
pub struct GroundParams {
    /// Side of the square filter window in pixels
    pub window_px: usize,
    /// Gaussian sigma in pixels applied afterwards; `<= 0` skips it
    pub sigma: f64,
    pub method: GroundMethod,
}

impl Default for GroundParams {
    fn default() -> Self {
        Self {
            window_px: 5,
            sigma: 1.0,
            method: GroundMethod::Opening,
        }
    }
}

/// Ground-from-surface algorithm
#[derive(Debug, Clone, Default)]
pub struct DeriveGround;

impl Algorithm for DeriveGround {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = GroundParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DeriveGround"
    }

    fn description(&self) -> &'static str {
        "Approximate a bare-ground model from a surface model by grey morphology"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        derive_ground(&input, params)
    }
}

/// Approximate the ground under a surface model
pub fn derive_ground(surface: &Raster<f64>, params: GroundParams) -> Result<Raster<f64>> {
    if params.window_px < 2 {
        return Err(Error::invalid_parameter(
            "window_px",
            params.window_px,
            "window must span at least 2 pixels",
        ));
    }

    let element = StructuringElement::Square(params.window_px / 2);
    let base = match params.method {
        GroundMethod::Opening => opening(surface, &element)?,
        GroundMethod::Minimum => erode(surface, &element)?,
    };
    debug!(
        window_px = params.window_px,
        method = ?params.method,
        "ground filter applied"
    );

    gaussian_smoothing(&base, GaussianParams { sigma: params.sigma })
}
