//! # Tengri Algorithms
//!
//! Analytical stages of the Tengri landing-zone engine.
//!
//! ## Modules
//!
//! - **terrain**: Slope, Gaussian smoothing, ground-from-surface derivation
//! - **morphology**: Binary and grey morphology with structuring elements
//! - **vector**: Polygonize, rasterize, buffers, distances, route sampling
//! - **landing**: Landing-zone candidates, distance transform, aircraft presets
//! - **obstacles**: Obstacle polygons from height above ground
//! - **clearance**: Route clearance against obstacles
//! - **config**: Engine-wide parameter defaults

pub mod clearance;
pub mod config;
pub mod landing;
mod maybe_rayon;
pub mod morphology;
pub mod obstacles;
pub mod terrain;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clearance::{
        evaluate_route, AltitudeMode, ClearanceParams, ClearanceResult, RouteClearance, SegmentStatus,
    };
    pub use crate::config::EngineConfig;
    pub use crate::landing::{
        extract_candidates, resolve_aircraft, AircraftOverrides, CandidateParams, CandidateResult, Candidates,
        Center,
    };
    pub use crate::morphology::{Morphology, StructuringElement};
    pub use crate::obstacles::{
        extract_obstacles, ExtractObstacles, HeightEstimate, ObstacleParams, ObstaclePolygon, ObstacleResult,
    };
    pub use crate::terrain::{derive_ground, slope, GroundMethod, GroundParams, SlopeParams};
    pub use tengri_core::prelude::*;
}
