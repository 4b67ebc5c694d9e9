//! Landing-zone candidate extraction
//!
//! Around a center point the elevation model is cut to a window, thresholded
//! on slope, refined by one morphological pass and vectorized. Regions whose
//! bounding box spans the minimum clear diameter are ranked by area; each of
//! the best three gets the center of its largest inscribed circle from a
//! distance transform of the refined mask.

use geo::{Area, BoundingRect, Point, Polygon};
use serde::{Deserialize, Serialize};
use tengri_core::raster::{Raster, Window};
use tengri_core::vector::{Feature, FeatureCollection};
use tengri_core::{Algorithm, Error, Result, CRS};
use tracing::{debug, info};

use super::edt::distance_transform;
use crate::morphology::{Morphology, StructuringElement};
use crate::terrain::{slope, SlopeParams};
use crate::vector::{polygonize, rasterize};

/// Metres per degree of latitude
const METERS_PER_DEG: f64 = 111_320.0;
/// Window size tried when the requested one holds no flat pixels
const FALLBACK_WINDOW_M: f64 = 2000.0;
/// Lower bound on the window half-extent in pixels
const MIN_HALF_PX: usize = 8;
/// Windows narrower than this in either axis are rejected
const MIN_WINDOW_PX: usize = 5;
/// Number of candidates kept after ranking
const MAX_CANDIDATES: usize = 3;

/// Search center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Center {
    /// WGS84 degrees, reprojected into the raster's reference
    Geographic { lat: f64, lon: f64 },
    /// Already in the raster's reference
    Projected { x: f64, y: f64 },
}

/// Parameters for candidate extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateParams {
    /// Half-width of the search window in metres
    pub window_m: f64,
    /// Pixels at or above this slope are not flat
    pub slope_max_deg: f64,
    /// Minimum bounding-box extent of a kept region in metres
    pub min_diameter_m: f64,
    pub morphology: Morphology,
}

impl Default for CandidateParams {
    fn default() -> Self {
        Self {
            window_m: 800.0,
            slope_max_deg: 12.0,
            min_diameter_m: 30.0,
            morphology: Morphology::Closing,
        }
    }
}

/// Why a run produced no candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmptyReason {
    #[serde(rename = "window too small in pixels")]
    WindowTooSmall,
    #[serde(rename = "no flat pixels under slope threshold")]
    NoFlatPixels,
    #[serde(rename = "no candidate region meets minimum diameter")]
    NoRegionLargeEnough,
}

impl EmptyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmptyReason::WindowTooSmall => "window too small in pixels",
            EmptyReason::NoFlatPixels => "no flat pixels under slope threshold",
            EmptyReason::NoRegionLargeEnough => "no candidate region meets minimum diameter",
        }
    }
}

/// A ranked flat region
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRegion {
    /// `LZ-<rank>`
    pub id: String,
    pub polygon: Polygon<f64>,
    /// Larger side of the bounding box in metres
    pub bbox_diameter_m: f64,
    /// Area in squared map units
    pub area: f64,
}

/// Center of the largest circle inside a candidate region
#[derive(Debug, Clone, PartialEq)]
pub struct LandingCenter {
    /// `LZ-CENTER-<rank>`, matching its region
    pub id: String,
    pub point: Point<f64>,
    /// Distance transform value at `point` less half the smaller pixel side.
    ///
    /// The raw transform measures center to nearest background center, half a
    /// pixel past the region edge; the inset keeps the circle inside the
    /// polygon, so the radius never exceeds half the bounding-box diameter.
    pub clear_radius_m: f64,
    pub clear_diameter_m: f64,
}

/// Run summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateMeta {
    /// Raster reference identifier
    pub crs: String,
    pub center_input: Center,
    /// Center in raster coordinates `[x, y]`
    pub center_raster: [f64; 2],
    /// Window size actually used
    pub window_m: f64,
    pub valid_pixels: usize,
    pub flat_pixels: usize,
    pub count: usize,
    pub slope_max_deg: f64,
    pub min_clear_diameter_m: f64,
    pub morphology: Morphology,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EmptyReason>,
}

/// Candidate extraction result
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub regions: Vec<CandidateRegion>,
    pub centers: Vec<LandingCenter>,
    pub meta: CandidateMeta,
    pub crs: CRS,
}

impl CandidateResult {
    /// Region features first, then center features
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let window_m = self.meta.window_m;
        let regions = self.regions.iter().map(|r| {
            Feature::new(r.polygon.clone())
                .with_id(r.id.clone())
                .with_property("id", r.id.as_str())
                .with_property("bbox_diameter_m", r.bbox_diameter_m)
                .with_property("min_clear_diameter_m", self.meta.min_clear_diameter_m)
                .with_property("window_m", window_m)
        });
        let centers = self.centers.iter().map(|c| {
            Feature::new(c.point)
                .with_id(c.id.clone())
                .with_property("id", c.id.as_str())
                .with_property("clear_radius_m", c.clear_radius_m)
                .with_property("clear_diameter_m", c.clear_diameter_m)
                .with_property("window_m", window_m)
        });
        regions.chain(centers).collect()
    }

    /// GeoJSON collection with the raster reference and a `meta` member
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        let mut fc = self.to_feature_collection().to_geojson(Some(&self.crs));
        let meta = serde_json::to_value(&self.meta).unwrap_or(serde_json::Value::Null);
        fc.foreign_members.get_or_insert_with(Default::default).insert("meta".to_string(), meta);
        fc
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Candidate extraction algorithm
#[derive(Debug, Clone, Default)]
pub struct Candidates;

impl Algorithm for Candidates {
    type Input = (Raster<f64>, Center);
    type Output = CandidateResult;
    type Params = CandidateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Candidates"
    }

    fn description(&self) -> &'static str {
        "Flat landing-zone candidates around a center, sized by inscribed circle"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (dem, center) = input;
        extract_candidates(&dem, center, &params)
    }
}

/// Window sizes to try, in order
fn window_schedule(window_m: f64) -> Vec<f64> {
    if window_m < FALLBACK_WINDOW_M {
        vec![window_m, FALLBACK_WINDOW_M]
    } else {
        vec![window_m]
    }
}

/// Metres per map unit along `(x, y)` at latitude `lat`
fn meters_per_unit(crs: &CRS, lat: f64) -> (f64, f64) {
    if crs.is_geographic() {
        (METERS_PER_DEG * lat.to_radians().cos(), METERS_PER_DEG)
    } else {
        (1.0, 1.0)
    }
}

impl Center {
    /// Position in `crs` and the latitude used for degree-to-metre scaling
    fn locate(&self, crs: &CRS) -> Result<((f64, f64), f64)> {
        match *self {
            Center::Geographic { lat, lon } => Ok((crs.from_wgs84(lon, lat)?, lat)),
            Center::Projected { x, y } => Ok(((x, y), y)),
        }
    }
}

/// World bounds in `crs` covering every window the extractor may try around
/// `center`, widened by `pad_m` metres.
///
/// Reading this area instead of the full raster gives the same result as
/// long as the pixel half-extent floor stays inside the pad.
pub fn search_bounds(crs: &CRS, center: Center, params: &CandidateParams, pad_m: f64) -> Result<(f64, f64, f64, f64)> {
    validate(params)?;
    let ((cx, cy), lat_ref) = center.locate(crs)?;
    let reach_m = window_schedule(params.window_m)
        .into_iter()
        .fold(0.0, f64::max)
        + pad_m.max(0.0);
    let (unit_x, unit_y) = meters_per_unit(crs, lat_ref);
    let (hx, hy) = (reach_m / unit_x.max(1e-6), reach_m / unit_y);
    Ok((cx - hx, cy - hy, cx + hx, cy + hy))
}

/// Extract ranked landing-zone candidates around `center`
pub fn extract_candidates(dem: &Raster<f64>, center: Center, params: &CandidateParams) -> Result<CandidateResult> {
    validate(params)?;
    let crs = dem.crs().cloned().ok_or(Error::MissingCrs)?;

    let ((cx, cy), lat_ref) = center.locate(&crs)?;
    let (row, col) = dem
        .transform()
        .index(cx, cy)
        .ok_or_else(|| Error::invalid_parameter("center", format!("({cx}, {cy})"), "not a finite raster position"))?;

    let (unit_x, unit_y) = meters_per_unit(&crs, lat_ref);
    let (px, py) = dem.pixel_size();
    let px_m = ((px * unit_x).max(1e-6), (py * unit_y).max(1e-6));
    debug!(row, col, px_m_x = px_m.0, px_m_y = px_m.1, "center located");

    let mut meta = CandidateMeta {
        crs: crs.identifier(),
        center_input: center,
        center_raster: [cx, cy],
        window_m: params.window_m,
        valid_pixels: 0,
        flat_pixels: 0,
        count: 0,
        slope_max_deg: params.slope_max_deg,
        min_clear_diameter_m: params.min_diameter_m,
        morphology: params.morphology,
        reason: None,
    };
    let empty = |meta: CandidateMeta, reason: EmptyReason| {
        info!(reason = reason.as_str(), window_m = meta.window_m, "no landing candidates");
        CandidateResult {
            regions: Vec::new(),
            centers: Vec::new(),
            meta: CandidateMeta {
                reason: Some(reason),
                ..meta
            },
            crs: crs.clone(),
        }
    };

    let (rows, cols) = dem.shape();
    let mut found = None;
    for window_m in window_schedule(params.window_m) {
        meta.window_m = window_m;
        let half_x = MIN_HALF_PX.max((window_m / px_m.0) as usize);
        let half_y = MIN_HALF_PX.max((window_m / px_m.1) as usize);
        let window = Window::around(row, col, half_y, half_x, rows, cols);
        if window.height < MIN_WINDOW_PX || window.width < MIN_WINDOW_PX {
            return Ok(empty(meta, EmptyReason::WindowTooSmall));
        }

        let sub = dem.subset(&window)?.normalized();
        let slope_deg = slope(&sub, SlopeParams { spacing: Some(px_m) })?;
        let flat = slope_deg
            .data()
            .mapv(|s| s.is_finite() && s < params.slope_max_deg);

        meta.valid_pixels = sub.data().iter().filter(|v| v.is_finite()).count();
        meta.flat_pixels = flat.iter().filter(|f| **f).count();
        debug!(
            window_m,
            rows = window.height,
            cols = window.width,
            valid = meta.valid_pixels,
            flat = meta.flat_pixels,
            "slope thresholded"
        );

        if meta.flat_pixels > 0 {
            found = Some((sub, flat));
            break;
        }
    }
    let Some((sub, flat)) = found else {
        return Ok(empty(meta, EmptyReason::NoFlatPixels));
    };

    let refined = params.morphology.apply(&flat, &StructuringElement::default())?;
    let transform = *sub.transform();
    let regions = polygonize(&refined, &transform);
    debug!(regions = regions.len(), morphology = %params.morphology, "flat mask vectorized");

    let mut kept: Vec<(Polygon<f64>, f64, f64)> = regions
        .into_iter()
        .filter_map(|region| {
            let bbox = region.polygon.bounding_rect()?;
            let diameter = (bbox.width() * unit_x).max(bbox.height() * unit_y);
            let area = region.polygon.unsigned_area();
            (diameter >= params.min_diameter_m).then_some((region.polygon, diameter, area))
        })
        .collect();
    if kept.is_empty() {
        return Ok(empty(meta, EmptyReason::NoRegionLargeEnough));
    }
    kept.sort_by(|a, b| b.2.total_cmp(&a.2));
    kept.truncate(MAX_CANDIDATES);

    let edt = distance_transform(&refined, px_m);
    let inset = 0.5 * px_m.0.min(px_m.1);
    let (sub_rows, sub_cols) = sub.shape();

    let mut out_regions = Vec::with_capacity(kept.len());
    let mut out_centers = Vec::with_capacity(kept.len());
    for (i, (polygon, bbox_diameter_m, area)) in kept.into_iter().enumerate() {
        let inside = rasterize(&polygon, &transform, sub_rows, sub_cols);
        let mut best = (0usize, 0usize, 0.0f64);
        for ((r, c), &d) in edt.indexed_iter() {
            let v = if inside[(r, c)] { d } else { 0.0 };
            if v > best.2 {
                best = (r, c, v);
            }
        }
        let (r, c, d) = best;
        let radius = (d - inset).max(0.0);
        let (x, y) = transform.pixel_to_geo(c, r);

        out_centers.push(LandingCenter {
            id: format!("LZ-CENTER-{}", i + 1),
            point: Point::new(x, y),
            clear_radius_m: radius,
            clear_diameter_m: 2.0 * radius,
        });
        out_regions.push(CandidateRegion {
            id: format!("LZ-{}", i + 1),
            polygon,
            bbox_diameter_m,
            area,
        });
    }

    meta.count = out_regions.len();
    info!(
        count = meta.count,
        window_m = meta.window_m,
        flat = meta.flat_pixels,
        "landing candidates extracted"
    );

    Ok(CandidateResult {
        regions: out_regions,
        centers: out_centers,
        meta,
        crs,
    })
}

fn validate(params: &CandidateParams) -> Result<()> {
    if !(params.window_m.is_finite() && params.window_m > 0.0) {
        return Err(Error::invalid_parameter("window_m", params.window_m, "must be positive"));
    }
    if !params.slope_max_deg.is_finite() {
        return Err(Error::invalid_parameter("slope_max_deg", params.slope_max_deg, "must be finite"));
    }
    if !params.min_diameter_m.is_finite() {
        return Err(Error::invalid_parameter("min_diameter_m", params.min_diameter_m, "must be finite"));
    }
    Ok(())
}
