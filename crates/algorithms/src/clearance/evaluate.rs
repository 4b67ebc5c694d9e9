//! Route clearance against extracted obstacles
//!
//! The route is sampled at a fixed arc-length step. Each pair of
//! consecutive samples forms a segment whose corridor is a round-capped
//! buffer; the highest obstacle top inside the corridor is compared with
//! the planned altitude at the segment midpoint.

use geo::{Centroid, Coord, Distance, Euclidean, Intersects, Line, LineString, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tengri_core::raster::{sample_nearest, Raster};
use tengri_core::vector::{Feature, FeatureCollection};
use tengri_core::{Algorithm, Error, Result, CRS};
use tracing::{debug, info};

use crate::obstacles::{round2, ObstaclePolygon};
use crate::vector::{buffer_segment, sample_route, BufferParams};

/// Reference for the planned altitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AltitudeMode {
    /// Above the ground under each segment midpoint
    #[default]
    Agl,
    /// Absolute elevation
    Msl,
}

impl AltitudeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AltitudeMode::Agl => "AGL",
            AltitudeMode::Msl => "MSL",
        }
    }
}

impl fmt::Display for AltitudeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AltitudeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AGL" => Ok(AltitudeMode::Agl),
            "MSL" => Ok(AltitudeMode::Msl),
            other => Err(Error::invalid_parameter("altitude_mode", other, "expected 'AGL' or 'MSL'")),
        }
    }
}

/// Parameters for clearance evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearanceParams {
    pub altitude_mode: AltitudeMode,
    /// Planned altitude in metres, relative to `altitude_mode`
    pub altitude_m: f64,
    /// Full corridor width in metres; the buffer distance is half of it
    pub corridor_width_m: f64,
    pub min_clearance_m: f64,
    /// Route sampling step in metres
    pub step_m: f64,
}

impl Default for ClearanceParams {
    fn default() -> Self {
        Self {
            altitude_mode: AltitudeMode::Agl,
            altitude_m: 60.0,
            corridor_width_m: 150.0,
            min_clearance_m: 30.0,
            step_m: 25.0,
        }
    }
}

/// Segment verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Pass,
    Fail,
    /// Clearance could not be computed
    Unknown,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Pass => "pass",
            SegmentStatus::Fail => "fail",
            SegmentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub index: usize,
    pub line: Line<f64>,
    pub clearance_m: Option<f64>,
    pub status: SegmentStatus,
}

/// Midpoint of a failing segment
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// Index of the failing segment
    pub index: usize,
    pub point: Point<f64>,
    pub clearance_m: f64,
    /// Extra altitude needed to reach the minimum clearance, in centimetres precision
    pub needed_extra_m: f64,
    /// Index into the obstacle list of the highest obstacle in the corridor
    pub nearest_obstacle: Option<usize>,
    pub distance_to_obstacle_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearanceSummary {
    pub segments: usize,
    pub fails: usize,
    pub unknowns: usize,
    pub min_clearance_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClearanceResult {
    pub segments: Vec<RouteSegment>,
    pub hotspots: Vec<Hotspot>,
    pub summary: ClearanceSummary,
    pub crs: Option<CRS>,
}

impl ClearanceResult {
    pub fn segment_features(&self) -> FeatureCollection {
        self.segments
            .iter()
            .map(|s| {
                Feature::new(LineString::from(vec![s.line.start, s.line.end]))
                    .with_property("i", s.index)
                    .with_property("clearance_m", s.clearance_m)
                    .with_property("status", s.status.as_str())
            })
            .collect()
    }

    pub fn hotspot_features(&self) -> FeatureCollection {
        self.hotspots
            .iter()
            .map(|h| {
                Feature::new(h.point)
                    .with_property("i", h.index)
                    .with_property("clearance_m", h.clearance_m)
                    .with_property("needed_extra_m", h.needed_extra_m)
                    .with_property("nearest_obstacle_idx", h.nearest_obstacle)
                    .with_property("distance_to_obstacle_m", h.distance_to_obstacle_m)
            })
            .collect()
    }

    /// `{segments, hotspots, summary}` with both collections as GeoJSON
    pub fn to_json(&self) -> serde_json::Value {
        let crs = self.crs.as_ref();
        serde_json::json!({
            "segments": self.segment_features().to_geojson(crs),
            "hotspots": self.hotspot_features().to_geojson(crs),
            "summary": self.summary,
        })
    }
}

/// Everything one clearance evaluation reads
#[derive(Debug, Clone)]
pub struct ClearanceInput {
    pub route: LineString<f64>,
    pub obstacles: Vec<ObstaclePolygon>,
    pub surface: Raster<f64>,
    pub ground: Option<Raster<f64>>,
}

/// Route clearance algorithm
#[derive(Debug, Clone, Default)]
pub struct RouteClearance;

impl Algorithm for RouteClearance {
    type Input = ClearanceInput;
    type Output = ClearanceResult;
    type Params = ClearanceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "RouteClearance"
    }

    fn description(&self) -> &'static str {
        "Per-segment obstacle clearance along a sampled route corridor"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        evaluate_route(
            &input.route,
            &input.obstacles,
            &input.surface,
            input.ground.as_ref(),
            &params,
        )
    }
}

/// Evaluate clearance along `route`.
///
/// Obstacle tops are ground at the obstacle centroid plus its height, or the
/// surface at the centroid without a ground model. With no obstacle in a
/// corridor the terrain at the segment midpoint stands in as the top.
pub fn evaluate_route(
    route: &LineString<f64>,
    obstacles: &[ObstaclePolygon],
    surface: &Raster<f64>,
    ground: Option<&Raster<f64>>,
    params: &ClearanceParams,
) -> Result<ClearanceResult> {
    validate(params)?;
    let samples = sample_route(route, params.step_m)?;
    debug!(samples = samples.len(), obstacles = obstacles.len(), "route sampled");

    let terrain = ground.unwrap_or(surface);
    let buffer = BufferParams {
        distance: params.corridor_width_m / 2.0,
        ..BufferParams::default()
    };

    let tops: Vec<f64> = obstacles
        .iter()
        .map(|o| match o.polygon.centroid() {
            Some(c) => match ground {
                Some(g) => sample_nearest(g, c.x(), c.y()) + o.height_m,
                None => sample_nearest(surface, c.x(), c.y()),
            },
            None => f64::NAN,
        })
        .collect();

    let mut segments = Vec::with_capacity(samples.len().saturating_sub(1));
    let mut hotspots = Vec::new();

    for (index, pair) in samples.windows(2).enumerate() {
        let line = Line::new(pair[0].0, pair[1].0);
        let corridor = buffer_segment(&line, &buffer);
        let mid = Coord {
            x: (line.start.x + line.end.x) / 2.0,
            y: (line.start.y + line.end.y) / 2.0,
        };

        // highest top in the corridor
        let mut highest: Option<(usize, f64)> = None;
        for (j, obstacle) in obstacles.iter().enumerate() {
            let top = tops[j];
            if top.is_nan() || !corridor.intersects(&obstacle.polygon) {
                continue;
            }
            if highest.map_or(true, |(_, best)| top > best) {
                highest = Some((j, top));
            }
        }

        let terrain_mid = sample_nearest(terrain, mid.x, mid.y);
        let top = highest.map_or(terrain_mid, |(_, top)| top);
        let route_z = match params.altitude_mode {
            AltitudeMode::Agl => terrain_mid + params.altitude_m,
            AltitudeMode::Msl => params.altitude_m,
        };

        let clearance = route_z - top;
        let (clearance_m, status) = if clearance.is_finite() {
            let status = if clearance >= params.min_clearance_m {
                SegmentStatus::Pass
            } else {
                SegmentStatus::Fail
            };
            (Some(clearance), status)
        } else {
            (None, SegmentStatus::Unknown)
        };

        if let (SegmentStatus::Fail, Some(clearance_m)) = (status, clearance_m) {
            let nearest = highest.map(|(j, _)| j);
            hotspots.push(Hotspot {
                index,
                point: Point::from(mid),
                clearance_m,
                needed_extra_m: round2(params.min_clearance_m - clearance_m),
                nearest_obstacle: nearest,
                distance_to_obstacle_m: nearest
                    .map(|j| Euclidean::distance(&line, &obstacles[j].polygon))
                    .filter(|d| d.is_finite()),
            });
        }

        segments.push(RouteSegment {
            index,
            line,
            clearance_m,
            status,
        });
    }

    let summary = summarize(&segments);
    info!(
        segments = summary.segments,
        fails = summary.fails,
        unknowns = summary.unknowns,
        mode = %params.altitude_mode,
        "route clearance evaluated"
    );

    Ok(ClearanceResult {
        segments,
        hotspots,
        summary,
        crs: surface.crs().cloned(),
    })
}

fn summarize(segments: &[RouteSegment]) -> ClearanceSummary {
    let count = |status| segments.iter().filter(|s| s.status == status).count();
    ClearanceSummary {
        segments: segments.len(),
        fails: count(SegmentStatus::Fail),
        unknowns: count(SegmentStatus::Unknown),
        min_clearance_m: segments
            .iter()
            .filter_map(|s| s.clearance_m)
            .reduce(f64::min),
    }
}

fn validate(params: &ClearanceParams) -> Result<()> {
    if !(params.corridor_width_m.is_finite() && params.corridor_width_m > 0.0) {
        return Err(Error::invalid_parameter(
            "corridor_width_m",
            params.corridor_width_m,
            "must be positive",
        ));
    }
    if !params.altitude_m.is_finite() {
        return Err(Error::invalid_parameter("altitude_m", params.altitude_m, "must be finite"));
    }
    if !params.min_clearance_m.is_finite() {
        return Err(Error::invalid_parameter(
            "min_clearance_m",
            params.min_clearance_m,
            "must be finite",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacles::ObstacleSource;
    use approx::assert_relative_eq;
    use geo::Polygon;
    use tengri_core::GeoTransform;

    fn terrain(value: f64) -> Raster<f64> {
        Raster::filled(40, 40, value)
            .with_transform(GeoTransform::new(0.0, 400.0, 10.0, -10.0))
            .with_crs(CRS::from_epsg(32636))
    }

    fn tower(x: f64, y: f64, half: f64, height_m: f64) -> ObstaclePolygon {
        ObstaclePolygon {
            polygon: Polygon::new(
                LineString::from(vec![
                    (x - half, y - half),
                    (x + half, y - half),
                    (x + half, y + half),
                    (x - half, y + half),
                    (x - half, y - half),
                ]),
                vec![],
            ),
            height_m,
            source: ObstacleSource::DsmDtm,
        }
    }

    fn params(mode: AltitudeMode, altitude_m: f64) -> ClearanceParams {
        ClearanceParams {
            altitude_mode: mode,
            altitude_m,
            corridor_width_m: 20.0,
            min_clearance_m: 10.0,
            step_m: 50.0,
        }
    }

    fn route() -> LineString<f64> {
        LineString::from(vec![(50.0, 200.0), (350.0, 200.0)])
    }

    #[test]
    fn test_open_terrain_passes() {
        let ground = terrain(100.0);
        let r = evaluate_route(&route(), &[], &ground, Some(&ground), &params(AltitudeMode::Agl, 30.0)).unwrap();
        assert_eq!(r.summary.segments, 6);
        assert_eq!(r.summary.fails, 0);
        assert_eq!(r.summary.min_clearance_m, Some(30.0));
        assert!(r.hotspots.is_empty());
    }

    #[test]
    fn test_tower_in_corridor_fails_with_hotspot() {
        let ground = terrain(100.0);
        let obstacles = vec![tower(200.0, 205.0, 3.0, 25.0)];
        let r = evaluate_route(&route(), &obstacles, &ground, Some(&ground), &params(AltitudeMode::Agl, 30.0)).unwrap();
        assert_eq!(r.summary.fails, 2);
        let h = &r.hotspots[0];
        assert_relative_eq!(h.clearance_m, 5.0);
        assert_relative_eq!(h.needed_extra_m, 5.0);
        assert_eq!(h.nearest_obstacle, Some(0));
        assert_relative_eq!(h.distance_to_obstacle_m.unwrap(), 2.0);
    }

    #[test]
    fn test_tower_on_route_is_at_zero_distance() {
        let ground = terrain(100.0);
        let obstacles = vec![tower(200.0, 200.0, 3.0, 25.0), tower(120.0, 207.0, 2.0, 10.0)];
        let r = evaluate_route(&route(), &obstacles, &ground, Some(&ground), &params(AltitudeMode::Agl, 30.0)).unwrap();
        assert_eq!(r.hotspots.len(), 2);
        for h in &r.hotspots {
            assert_eq!(h.nearest_obstacle, Some(0));
            assert_eq!(h.distance_to_obstacle_m, Some(0.0));
        }
    }

    #[test]
    fn test_tower_outside_corridor_ignored() {
        let ground = terrain(100.0);
        let obstacles = vec![tower(200.0, 260.0, 3.0, 200.0)];
        let r = evaluate_route(&route(), &obstacles, &ground, Some(&ground), &params(AltitudeMode::Agl, 30.0)).unwrap();
        assert_eq!(r.summary.fails, 0);
    }

    #[test]
    fn test_msl_below_terrain_fails() {
        let surface = terrain(100.0);
        let r = evaluate_route(&route(), &[], &surface, None, &params(AltitudeMode::Msl, 105.0)).unwrap();
        assert_eq!(r.summary.fails, r.summary.segments);
        assert_eq!(r.hotspots.len(), r.summary.segments);
        assert_eq!(r.hotspots[0].nearest_obstacle, None);
        assert_eq!(r.hotspots[0].distance_to_obstacle_m, None);
    }

    #[test]
    fn test_nodata_terrain_is_unknown() {
        let surface = terrain(-9999.0).with_nodata(-9999.0);
        let r = evaluate_route(&route(), &[], &surface, None, &params(AltitudeMode::Agl, 30.0)).unwrap();
        assert_eq!(r.summary.unknowns, r.summary.segments);
        assert_eq!(r.summary.min_clearance_m, None);
        let fc = r.segment_features();
        assert_eq!(
            fc.features[0].get_property("status").and_then(|v| v.as_str()),
            Some("unknown")
        );
    }

    #[test]
    fn test_altitude_mode_parsing() {
        assert_eq!("agl".parse::<AltitudeMode>().unwrap(), AltitudeMode::Agl);
        assert_eq!(" MSL ".parse::<AltitudeMode>().unwrap(), AltitudeMode::Msl);
        assert!("AMSL".parse::<AltitudeMode>().is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        let ground = terrain(100.0);
        let mut p = params(AltitudeMode::Agl, 30.0);
        p.step_m = 0.0;
        assert!(evaluate_route(&route(), &[], &ground, None, &p).is_err());
        let mut p = params(AltitudeMode::Agl, 30.0);
        p.corridor_width_m = -1.0;
        assert!(evaluate_route(&route(), &[], &ground, None, &p).is_err());
        let short = LineString::from(vec![(0.0, 0.0)]);
        assert!(evaluate_route(&short, &[], &ground, None, &params(AltitudeMode::Agl, 30.0)).is_err());
    }
}
