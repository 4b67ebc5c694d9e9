//! Obstacle extraction
//!
//! Obstacles are connected areas standing at least a minimum height above
//! the ground, either measured against a ground model (`DSM-DTM`) or
//! against a low-pass of the surface itself (`DSM-highpass`).

mod extract;

pub(crate) use extract::round2;
pub use extract::{
    extract_obstacles, height_above_ground, percentile, ExtractObstacles, HeightEstimate, ObstacleParams,
    ObstaclePolygon, ObstacleResult, ObstacleSource,
};
