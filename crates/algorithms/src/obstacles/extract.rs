//! Obstacle extraction from surface and ground models
//!
//! Height above ground is thresholded, cleaned with an opening then a
//! closing, and vectorized. Each polygon carries a 95th-percentile height.

use geo::{Area, Geometry, Polygon};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use tengri_core::raster::{resample_bilinear, Raster};
use tengri_core::vector::{Feature, FeatureCollection};
use tengri_core::{Algorithm, Error, Result, CRS};
use tracing::{debug, info, warn};

use crate::morphology::{binary_closing, binary_opening, StructuringElement};
use crate::terrain::gaussian_blur;
use crate::vector::{polygonize, rasterize};

/// Sigma in pixels of the low-pass removed without a ground model
const HIGHPASS_SIGMA: f64 = 5.0;
/// Height written over cells with no usable value
const INVALID_HEIGHT: f64 = -9999.0;
/// Percentile used as the representative obstacle height
const HEIGHT_PERCENTILE: f64 = 95.0;

/// How the representative height of each obstacle is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightEstimate {
    /// Percentile over every obstacle pixel in the raster, shared by all polygons
    #[default]
    Global,
    /// Percentile over each polygon's own pixels
    PerPolygon,
}

/// How height above ground was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleSource {
    /// Surface minus a ground model
    #[serde(rename = "DSM-DTM")]
    DsmDtm,
    /// Surface minus its own low-pass
    #[serde(rename = "DSM-highpass")]
    DsmHighpass,
}

impl ObstacleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleSource::DsmDtm => "DSM-DTM",
            ObstacleSource::DsmHighpass => "DSM-highpass",
        }
    }
}

impl fmt::Display for ObstacleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for obstacle extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    /// Cells at least this far above ground are obstacles
    pub min_height_m: f64,
    /// Gaussian sigma in pixels applied to the height grid; `<= 0` skips it
    pub sigma: f64,
    pub height: HeightEstimate,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            min_height_m: 2.0,
            sigma: 1.0,
            height: HeightEstimate::Global,
        }
    }
}

/// One vectorized obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct ObstaclePolygon {
    pub polygon: Polygon<f64>,
    /// Height above ground in metres, rounded to centimetres
    pub height_m: f64,
    pub source: ObstacleSource,
}

impl ObstaclePolygon {
    pub fn to_feature(&self) -> Feature {
        Feature::new(self.polygon.clone())
            .with_property("height_m", self.height_m)
            .with_property("source", self.source.as_str())
    }

    /// Read obstacles back from features.
    ///
    /// Multipolygons split into their parts; other geometries are skipped.
    /// A missing height counts as 0 and a missing source as `DSM-DTM`.
    pub fn from_features(features: &FeatureCollection) -> Vec<Self> {
        features
            .iter()
            .flat_map(|f| {
                let height_m = f.get_property("height_m").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let source = match f.get_property("source").and_then(|v| v.as_str()) {
                    Some("DSM-highpass") => ObstacleSource::DsmHighpass,
                    _ => ObstacleSource::DsmDtm,
                };
                let polygons = match &f.geometry {
                    Some(Geometry::Polygon(p)) => vec![p.clone()],
                    Some(Geometry::MultiPolygon(mp)) => mp.0.clone(),
                    _ => Vec::new(),
                };
                polygons.into_iter().map(move |polygon| ObstaclePolygon {
                    polygon,
                    height_m,
                    source,
                })
            })
            .collect()
    }
}

/// Extracted obstacles with the surface's reference
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleResult {
    pub obstacles: Vec<ObstaclePolygon>,
    pub source: ObstacleSource,
    pub crs: Option<CRS>,
}

impl ObstacleResult {
    pub fn to_feature_collection(&self) -> FeatureCollection {
        self.obstacles.iter().map(ObstaclePolygon::to_feature).collect()
    }

    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        self.to_feature_collection().to_geojson(self.crs.as_ref())
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

/// Obstacle extraction algorithm
#[derive(Debug, Clone, Default)]
pub struct ExtractObstacles;

impl Algorithm for ExtractObstacles {
    type Input = (Raster<f64>, Option<Raster<f64>>);
    type Output = ObstacleResult;
    type Params = ObstacleParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ExtractObstacles"
    }

    fn description(&self) -> &'static str {
        "Obstacle polygons from height above ground with percentile heights"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (surface, ground) = input;
        extract_obstacles(&surface, ground.as_ref(), &params)
    }
}

/// Height-above-ground grid on the surface's grid, before smoothing
pub fn height_above_ground(surface: &Raster<f64>, ground: Option<&Raster<f64>>) -> (Array2<f64>, ObstacleSource) {
    let s = surface.normalized().into_array();

    match ground {
        Some(ground) => {
            let mut g = if ground.same_grid(surface) {
                ground.normalized().into_array()
            } else {
                debug!(
                    ground = ?ground.shape(),
                    surface = ?surface.shape(),
                    "resampling ground onto the surface grid"
                );
                resample_bilinear(ground, surface).into_array()
            };
            Zip::from(&mut g).and(&s).for_each(|g, s| {
                if s.is_nan() {
                    *g = f64::NAN;
                }
            });
            (&s - &g, ObstacleSource::DsmDtm)
        }
        None => {
            let base = gaussian_blur(&s, HIGHPASS_SIGMA);
            (&s - &base, ObstacleSource::DsmHighpass)
        }
    }
}

/// Extract obstacle polygons from a surface model and an optional ground model
pub fn extract_obstacles(
    surface: &Raster<f64>,
    ground: Option<&Raster<f64>>,
    params: &ObstacleParams,
) -> Result<ObstacleResult> {
    if !params.min_height_m.is_finite() {
        return Err(Error::invalid_parameter("min_height_m", params.min_height_m, "must be finite"));
    }
    if params.sigma.is_nan() {
        return Err(Error::invalid_parameter("sigma", params.sigma, "must be a number"));
    }
    if ground.is_none() {
        warn!("no ground model, using surface high-pass as height above ground");
    }

    let (raw, source) = height_above_ground(surface, ground);
    let height = gaussian_blur(&raw, params.sigma).mapv(|h| if h.is_finite() { h } else { INVALID_HEIGHT });

    let mask = height.mapv(|h| h >= params.min_height_m);
    let element = StructuringElement::Disk(1);
    let mask = binary_closing(&binary_opening(&mask, &element)?, &element)?;
    let mask_pixels = mask.iter().filter(|m| **m).count();
    debug!(mask_pixels, min_height_m = params.min_height_m, "obstacle mask cleaned");

    let global = percentile(masked_values(&height, &mask), HEIGHT_PERCENTILE);
    let (rows, cols) = mask.dim();
    let transform = surface.transform();

    let obstacles: Vec<ObstaclePolygon> = polygonize(&mask, transform)
        .into_iter()
        .filter(|region| region.polygon.unsigned_area() > 0.0)
        .filter_map(|region| {
            let estimate = match params.height {
                HeightEstimate::Global => global,
                HeightEstimate::PerPolygon => {
                    let own = rasterize(&region.polygon, transform, rows, cols);
                    percentile(masked_values(&height, &own), HEIGHT_PERCENTILE)
                }
            }?;
            Some(ObstaclePolygon {
                polygon: region.polygon,
                height_m: round2(estimate),
                source,
            })
        })
        .collect();

    info!(count = obstacles.len(), source = %source, "obstacles extracted");

    Ok(ObstacleResult {
        obstacles,
        source,
        crs: surface.crs().cloned(),
    })
}

fn masked_values(values: &Array2<f64>, mask: &Array2<bool>) -> Vec<f64> {
    values
        .iter()
        .zip(mask.iter())
        .filter(|(v, m)| **m && !v.is_nan())
        .map(|(v, _)| *v)
        .collect()
}

/// `q`-th percentile with linear interpolation between closest ranks
pub fn percentile(mut values: Vec<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(values[lo] + (values[hi] - values[lo]) * (rank - lo as f64))
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
