//! End-to-end scenarios: rasters go through GeoTIFF files the way the CLI
//! feeds them, then through the extractors and the clearance evaluator.

use geo::LineString;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tengri_algorithms::clearance::{evaluate_route, AltitudeMode, ClearanceParams, SegmentStatus};
use tengri_algorithms::landing::{extract_candidates, search_bounds, CandidateParams, Center};
use tengri_algorithms::obstacles::{extract_obstacles, ObstacleParams};
use tengri_algorithms::terrain::{derive_ground, GroundParams};
use tengri_algorithms::vector::sample_route;
use tengri_core::crs::wgs84_to_utm;
use tengri_core::io::{read_geotiff, read_geotiff_bounds, read_geotiff_crs, write_geotiff};
use tengri_core::{GeoTransform, Raster, CRS};

/// 30 m UTM 36N grid with its top-left corner at `(0, y0)`
fn utm_grid(data: Array2<f64>, y0: f64) -> Raster<f64> {
    Raster::from_array(data)
        .with_transform(GeoTransform::new(0.0, y0, 30.0, -30.0))
        .with_crs(CRS::from_epsg(32636))
}

fn block(rows: usize, cols: usize, base: f64, range: std::ops::Range<usize>, add: f64) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        if range.contains(&r) && range.contains(&c) {
            base + add
        } else {
            base
        }
    })
}

fn write(dir: &Path, name: &str, raster: &Raster<f64>) -> PathBuf {
    let path = dir.join(name);
    write_geotiff(raster, &path).unwrap();
    path
}

/// DTM and DSM of flat ground at 100 m with a raised block
fn scene(size: usize, range: std::ops::Range<usize>, add: f64, y0: f64) -> (tempfile::TempDir, Raster<f64>, Raster<f64>) {
    let dir = tempfile::tempdir().unwrap();
    let dtm = write(dir.path(), "dtm.tif", &utm_grid(Array2::from_elem((size, size), 100.0), y0));
    let dsm = write(dir.path(), "dsm.tif", &utm_grid(block(size, size, 100.0, range, add), y0));
    let dtm: Raster<f64> = read_geotiff(&dtm).unwrap();
    let dsm: Raster<f64> = read_geotiff(&dsm).unwrap();
    (dir, dsm, dtm)
}

fn clearance_params(altitude_m: f64) -> ClearanceParams {
    ClearanceParams {
        altitude_mode: AltitudeMode::Agl,
        altitude_m,
        corridor_width_m: 30.0,
        min_clearance_m: 6.0,
        step_m: 5.0,
    }
}

#[test]
fn block_obstacle_height_from_files() {
    let (_dir, dsm, dtm) = scene(50, 20..30, 5.0, 1000.0);
    assert_eq!(dsm.crs(), Some(&CRS::from_epsg(32636)));

    let result = extract_obstacles(&dsm, Some(&dtm), &ObstacleParams::default()).unwrap();
    assert!(!result.is_empty());
    let h = result.obstacles[0].height_m;
    assert!((4.0..=6.0).contains(&h), "height {h}");

    let gj = result.to_geojson();
    assert_eq!(gj.features[0].property("source").and_then(|v| v.as_str()), Some("DSM-DTM"));
}

#[test]
fn route_over_block_fails_low_and_passes_high() {
    let (_dir, dsm, dtm) = scene(60, 25..35, 8.0, 1800.0);
    let obstacles = extract_obstacles(&dsm, Some(&dtm), &ObstacleParams::default()).unwrap().obstacles;
    assert!(!obstacles.is_empty());
    let route = LineString::from(vec![(600.0, 900.0), (1200.0, 900.0)]);

    let low = evaluate_route(&route, &obstacles, &dsm, Some(&dtm), &clearance_params(5.0)).unwrap();
    assert!(low.summary.fails >= 1);
    assert!(!low.hotspots.is_empty());
    assert!(low.hotspots.iter().all(|h| h.needed_extra_m > 0.0));
    let over_block: Vec<_> = low.hotspots.iter().filter(|h| h.nearest_obstacle == Some(0)).collect();
    assert!(!over_block.is_empty());
    assert!(over_block.iter().all(|h| h.clearance_m < 0.0));

    let high = evaluate_route(&route, &obstacles, &dsm, Some(&dtm), &clearance_params(15.0)).unwrap();
    assert_eq!(high.summary.fails, 0);
    assert_eq!(high.summary.unknowns, 0);
    assert!(high.hotspots.is_empty());
}

#[test]
fn clearance_grows_with_altitude() {
    let (_dir, dsm, dtm) = scene(60, 25..35, 8.0, 1800.0);
    let obstacles = extract_obstacles(&dsm, Some(&dtm), &ObstacleParams::default()).unwrap().obstacles;
    let route = LineString::from(vec![(450.0, 700.0), (1300.0, 1100.0), (1500.0, 1500.0)]);

    let runs: Vec<_> = [0.0, 5.0, 12.5, 40.0]
        .iter()
        .map(|&alt| evaluate_route(&route, &obstacles, &dsm, Some(&dtm), &clearance_params(alt)).unwrap())
        .collect();

    for pair in runs.windows(2) {
        assert_eq!(pair[0].segments.len(), pair[1].segments.len());
        for (a, b) in pair[0].segments.iter().zip(&pair[1].segments) {
            assert!(b.clearance_m.unwrap() >= a.clearance_m.unwrap());
        }
        assert!(pair[1].summary.fails <= pair[0].summary.fails);
    }
}

#[test]
fn open_ground_passes_above_minimum() {
    let (_dir, _dsm, dtm) = scene(40, 0..0, 0.0, 1200.0);
    let route = LineString::from(vec![(100.0, 100.0), (1000.0, 1100.0)]);
    let result = evaluate_route(&route, &[], &dtm, Some(&dtm), &clearance_params(6.0)).unwrap();
    assert!(result.segments.iter().all(|s| s.status == SegmentStatus::Pass));
    assert_eq!(result.summary.min_clearance_m, Some(6.0));
}

#[test]
fn route_sample_count() {
    for (length, step) in [(100.0, 25.0), (103.0, 25.0), (10.0, 3.0), (0.5, 1.0), (1000.0, 7.0)] {
        let route = LineString::from(vec![(0.0, 0.0), (length, 0.0)]);
        let samples = sample_route(&route, step).unwrap();
        let regular = (length / step).floor() as usize + 1;
        let last_regular = (regular - 1) as f64 * step;
        let expected = if (length - last_regular) > 1e-6 { regular + 1 } else { regular };
        assert_eq!(samples.len(), expected, "length {length}, step {step}");
    }
}

/// 10 m grid around `(x, y)`: steep ramp with a flat 20x20 square in the middle
fn candidate_dem(x: f64, y: f64) -> Raster<f64> {
    let data = Array2::from_shape_fn((100, 100), |(r, c)| {
        if (40..60).contains(&r) && (40..60).contains(&c) {
            800.0
        } else {
            800.0 + 3.0 * (r as f64 + c as f64)
        }
    });
    Raster::from_array(data)
        .with_transform(GeoTransform::new(x - 500.0, y + 500.0, 10.0, -10.0))
        .with_crs(CRS::from_epsg(32636))
}

#[test]
fn flat_square_becomes_candidate_from_geographic_center() {
    let (lon, lat) = (33.2, 39.9);
    let (x, y) = wgs84_to_utm(lon, lat, 36, true);
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dem.tif", &candidate_dem(x, y));

    let params = CandidateParams {
        window_m: 250.0,
        min_diameter_m: 60.0,
        ..CandidateParams::default()
    };
    let center = Center::Geographic { lat, lon };
    let crs = read_geotiff_crs(&path).unwrap().unwrap();
    let dem: Raster<f64> = read_geotiff_bounds(&path, search_bounds(&crs, center, &params, 200.0).unwrap()).unwrap();

    let result = extract_candidates(&dem, center, &params).unwrap();
    assert_eq!(result.meta.reason, None);
    assert!(!result.regions.is_empty());
    assert!((result.meta.center_raster[0] - x).abs() < 1e-6);

    let region = &result.regions[0];
    let center = &result.centers[0];
    assert!(region.bbox_diameter_m >= params.min_diameter_m);
    assert!(center.clear_radius_m > 0.0);
    assert!(center.clear_radius_m <= region.bbox_diameter_m / 2.0);
    assert!((center.point.x() - x).abs() <= 100.0 && (center.point.y() - y).abs() <= 100.0);
}

#[test]
fn fallback_window_reaches_distant_flat_ground() {
    // 5 km ramp; the only flat ground lies 1.6 km and more from the center
    let (x0, y0) = (500_000.0, 4_405_000.0);
    let data = Array2::from_shape_fn((500, 500), |(r, c)| {
        if (60..90).contains(&r) && (60..90).contains(&c) {
            800.0
        } else {
            800.0 + 3.0 * (r as f64 + c as f64)
        }
    });
    let raster = Raster::from_array(data)
        .with_transform(GeoTransform::new(x0, y0, 10.0, -10.0))
        .with_crs(CRS::from_epsg(32636));
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "dem.tif", &raster);

    let params = CandidateParams::default();
    let center = Center::Projected {
        x: x0 + 2500.0,
        y: y0 - 2500.0,
    };
    let crs = read_geotiff_crs(&path).unwrap().unwrap();
    let bounds = search_bounds(&crs, center, &params, 200.0).unwrap();
    assert!(bounds.2 - bounds.0 >= 4000.0 && bounds.3 - bounds.1 >= 4000.0);
    let dem: Raster<f64> = read_geotiff_bounds(&path, bounds).unwrap();
    assert!(dem.rows() >= 400 && dem.cols() >= 400);

    let result = extract_candidates(&dem, center, &params).unwrap();
    assert_eq!(result.meta.reason, None);
    assert_eq!(result.meta.window_m, 2000.0);
    assert_eq!(result.regions.len(), 1);
    let p = result.centers[0].point;
    assert!((x0 + 600.0..=x0 + 900.0).contains(&p.x()), "x {}", p.x());
    assert!((y0 - 900.0..=y0 - 600.0).contains(&p.y()), "y {}", p.y());
}

#[test]
fn candidates_are_idempotent() {
    let dem = candidate_dem(500_000.0, 4_400_000.0);
    let center = Center::Projected {
        x: 500_000.0,
        y: 4_400_000.0,
    };
    let a = extract_candidates(&dem, center, &CandidateParams::default()).unwrap();
    let b = extract_candidates(&dem, center, &CandidateParams::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_feature_collection(), b.to_feature_collection());
}

#[test]
fn ground_from_surface_flattens_dome() {
    let data = Array2::from_shape_fn((80, 80), |(r, c)| {
        let dy = (r as f64 - 40.0) / 10.0;
        let dx = (c as f64 - 40.0) / 10.0;
        let r2 = dx * dx + dy * dy;
        200.0 + if r2 <= 1.0 { 8.0 * (1.0 - r2) } else { 0.0 }
    });
    let dsm = utm_grid(data, 2400.0);
    let ground = derive_ground(&dsm, GroundParams::default()).unwrap();
    let center_h = dsm.get(40, 40).unwrap() - ground.get(40, 40).unwrap();
    assert!(center_h <= 2.0, "residual {center_h}");
    assert!((ground.get(5, 5).unwrap() - 200.0).abs() < 1e-9);
}
