//! Tengri CLI - landing-zone candidates, obstacles and route clearance

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use geo::LineString;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tengri_algorithms::clearance::{evaluate_route, AltitudeMode};
use tengri_algorithms::config::EngineConfig;
use tengri_algorithms::landing::{extract_candidates, search_bounds, AircraftOverrides, Center};
use tengri_algorithms::morphology::Morphology;
use tengri_algorithms::obstacles::{extract_obstacles, HeightEstimate, ObstaclePolygon};
use tengri_algorithms::terrain::{derive_ground, GroundMethod, GroundParams};
use tengri_core::io::{read_geotiff, read_geotiff_bounds, read_geotiff_crs, write_geotiff};
use tengri_core::vector::FeatureCollection;
use tengri_core::Raster;

/// Margin added around every area of interest, metres
const AOI_PAD_M: f64 = 200.0;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tengri")]
#[command(author, version, about = "Helicopter landing zones and route clearance", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with engine defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Find landing-zone candidates around a point
    Candidates {
        /// Input DEM file
        dem: PathBuf,
        /// Center latitude (WGS84)
        #[arg(long, requires = "lon", conflicts_with_all = ["x", "y"])]
        lat: Option<f64>,
        /// Center longitude (WGS84)
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
        /// Center easting in the raster reference
        #[arg(long, requires = "y")]
        x: Option<f64>,
        /// Center northing in the raster reference
        #[arg(long, requires = "x")]
        y: Option<f64>,
        /// Aircraft preset: EC135, UH-1H, S70
        #[arg(short, long)]
        aircraft: Option<String>,
        /// Search window half-width in metres
        #[arg(long)]
        window: Option<f64>,
        /// Maximum slope in degrees
        #[arg(long)]
        slope_max: Option<f64>,
        /// Minimum clear diameter in metres
        #[arg(long)]
        min_diameter: Option<f64>,
        /// Mask refinement: closing, opening
        #[arg(long)]
        morphology: Option<String>,
        /// Rotor diameter override in metres
        #[arg(long)]
        rotor_diameter: Option<f64>,
        /// Safety margin override in metres
        #[arg(long)]
        safety_margin: Option<f64>,
        /// Diameter factor override
        #[arg(long)]
        k: Option<f64>,
        /// Output GeoJSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract obstacle polygons from surface and ground models
    Obstacles {
        /// Surface model (DSM)
        #[arg(long)]
        dsm: PathBuf,
        /// Ground model (DTM); high-pass of the DSM when omitted
        #[arg(long)]
        dtm: Option<PathBuf>,
        /// Area of interest: minx,miny,maxx,maxy
        #[arg(long, value_parser = parse_bounds)]
        bounds: Option<(f64, f64, f64, f64)>,
        /// Scan the whole raster when no bounds are given
        #[arg(long)]
        allow_full: bool,
        /// Minimum height above ground in metres
        #[arg(long)]
        min_height: Option<f64>,
        /// Gaussian sigma in pixels for the height raster
        #[arg(long)]
        sigma: Option<f64>,
        /// Height estimate per obstacle instead of raster-wide
        #[arg(long)]
        per_polygon: bool,
        /// Output GeoJSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate obstacle clearance along a route
    Clearance {
        /// Surface model (DSM)
        #[arg(long)]
        dsm: PathBuf,
        /// Ground model (DTM)
        #[arg(long)]
        dtm: Option<PathBuf>,
        /// Route vertices in the raster reference: "x,y;x,y;..."
        #[arg(long, value_parser = parse_route)]
        route: LineString<f64>,
        /// Obstacle GeoJSON from the obstacles command
        #[arg(long)]
        obstacles: PathBuf,
        /// Altitude reference: AGL, MSL
        #[arg(long)]
        mode: Option<String>,
        /// Flight altitude in metres
        #[arg(long)]
        altitude: Option<f64>,
        /// Corridor width in metres
        #[arg(long)]
        corridor: Option<f64>,
        /// Minimum clearance in metres
        #[arg(long)]
        min_clearance: Option<f64>,
        /// Sampling step in metres
        #[arg(long)]
        step: Option<f64>,
        /// Output JSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cut a raster to world bounds
    Subset {
        /// Input raster file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// minx,miny,maxx,maxy
        #[arg(long, value_parser = parse_bounds)]
        bounds: (f64, f64, f64, f64),
    },
    /// Derive a ground model from a surface model
    Ground {
        /// Input DSM file
        input: PathBuf,
        /// Output DTM file
        output: PathBuf,
        /// Filter window side in pixels
        #[arg(short, long, default_value = "5")]
        window: usize,
        /// Gaussian sigma in pixels (0 disables)
        #[arg(short, long, default_value = "1.0")]
        sigma: f64,
        /// Filter: open, min
        #[arg(short, long, default_value = "open")]
        method: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::from_path(p).with_context(|| format!("Failed to load config: {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner(&format!("Reading {}", path.display()));
    let raster = read_geotiff(path).with_context(|| format!("Failed to read raster: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

fn read_raster_aoi(path: &Path, bounds: (f64, f64, f64, f64)) -> Result<Raster<f64>> {
    let pb = spinner(&format!("Reading {}", path.display()));
    let raster = read_geotiff_bounds(path, bounds)
        .with_context(|| format!("Failed to read area of interest from {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

fn emit(json: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(json)?;
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn done(name: &str, elapsed: std::time::Duration) {
    info!("{} done in {:.2?}", name, elapsed);
}

fn parse_bounds(s: &str) -> std::result::Result<(f64, f64, f64, f64), String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("bad bound '{}': {}", v, e)))
        .collect::<std::result::Result<_, _>>()?;
    match values.as_slice() {
        [minx, miny, maxx, maxy] if minx < maxx && miny < maxy => Ok((*minx, *miny, *maxx, *maxy)),
        [_, _, _, _] => Err("bounds must satisfy minx < maxx and miny < maxy".into()),
        _ => Err("expected minx,miny,maxx,maxy".into()),
    }
}

fn parse_route(s: &str) -> std::result::Result<LineString<f64>, String> {
    let mut coords = Vec::new();
    for pair in s.split(';').filter(|p| !p.trim().is_empty()) {
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| format!("expected x,y but got '{}'", pair))?;
        let x: f64 = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
        let y: f64 = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
        coords.push((x, y));
    }
    if coords.len() < 2 {
        return Err("a route needs at least two vertices".into());
    }
    Ok(LineString::from(coords))
}

fn route_aoi(route: &LineString<f64>, corridor_m: f64) -> (f64, f64, f64, f64) {
    let pad = corridor_m / 2.0 + AOI_PAD_M;
    let (mut minx, mut miny) = (f64::INFINITY, f64::INFINITY);
    let (mut maxx, mut maxy) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in route.coords() {
        minx = minx.min(c.x);
        miny = miny.min(c.y);
        maxx = maxx.max(c.x);
        maxy = maxy.max(c.y);
    }
    (minx - pad, miny - pad, maxx + pad, maxy + pad)
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let (px, py) = raster.pixel_size();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Pixel size: {} x {}", px, py);
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            match raster.crs() {
                Some(crs) => println!("CRS: {}", crs),
                None => println!("CRS: none"),
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        Commands::Candidates {
            dem,
            lat,
            lon,
            x,
            y,
            aircraft,
            window,
            slope_max,
            min_diameter,
            morphology,
            rotor_diameter,
            safety_margin,
            k,
            output,
        } => {
            let overrides = AircraftOverrides {
                rotor_diameter_m: rotor_diameter,
                safety_margin_m: safety_margin,
                k,
                slope_max_deg: slope_max,
            };
            let mut config = config;
            if let Some(m) = min_diameter {
                config.candidates.min_diameter_m = m;
            }
            let (mut params, resolved) = config.candidates_for_aircraft(aircraft.as_deref(), &overrides);
            if let Some(w) = window {
                params.window_m = w;
            }
            if let Some(m) = morphology {
                params.morphology = m.parse::<Morphology>()?;
            }
            info!(
                "Aircraft {:?}: slope <= {} deg, clear diameter >= {:.1} m",
                resolved.code, params.slope_max_deg, params.min_diameter_m
            );

            let center = match (lat, lon, x, y) {
                (Some(lat), Some(lon), _, _) => Center::Geographic { lat, lon },
                (_, _, Some(x), Some(y)) => Center::Projected { x, y },
                _ => bail!("Give a center with --lat/--lon or --x/--y"),
            };

            let crs = read_geotiff_crs(&dem)
                .with_context(|| format!("Failed to read header: {}", dem.display()))?
                .context("DEM has no reference system")?;
            let aoi = search_bounds(&crs, center, &params, AOI_PAD_M)
                .with_context(|| format!("Cannot place the center in {}", crs))?;
            let raster = read_raster_aoi(&dem, aoi)?;

            let start = Instant::now();
            let result = extract_candidates(&raster, center, &params).context("Candidate extraction failed")?;
            done("Candidates", start.elapsed());
            match result.meta.reason {
                Some(reason) => info!("No candidates: {}", reason.as_str()),
                None => info!("{} candidate(s)", result.meta.count),
            }
            emit(&serde_json::to_value(result.to_geojson())?, output.as_deref())?;
        }

        Commands::Obstacles {
            dsm,
            dtm,
            bounds,
            allow_full,
            min_height,
            sigma,
            per_polygon,
            output,
        } => {
            let mut params = config.obstacles;
            if let Some(h) = min_height {
                params.min_height_m = h;
            }
            if let Some(s) = sigma {
                params.sigma = s;
            }
            if per_polygon {
                params.height = HeightEstimate::PerPolygon;
            }

            let (surface, ground) = match bounds {
                Some(b) => (
                    read_raster_aoi(&dsm, b)?,
                    dtm.as_deref().map(|p| read_raster_aoi(p, b)).transpose()?,
                ),
                None if allow_full => (read_raster(&dsm)?, dtm.as_deref().map(read_raster).transpose()?),
                None => bail!("Refusing a full-raster scan; give --bounds or --allow-full"),
            };

            let start = Instant::now();
            let result = extract_obstacles(&surface, ground.as_ref(), &params).context("Obstacle extraction failed")?;
            done("Obstacles", start.elapsed());
            info!("{} obstacle(s) from {}", result.len(), result.source.as_str());
            emit(&serde_json::to_value(result.to_geojson())?, output.as_deref())?;
        }

        Commands::Clearance {
            dsm,
            dtm,
            route,
            obstacles,
            mode,
            altitude,
            corridor,
            min_clearance,
            step,
            output,
        } => {
            let mut params = config.clearance;
            if let Some(m) = mode {
                params.altitude_mode = m.parse::<AltitudeMode>()?;
            }
            if let Some(a) = altitude {
                params.altitude_m = a;
            }
            if let Some(c) = corridor {
                params.corridor_width_m = c;
            }
            if let Some(c) = min_clearance {
                params.min_clearance_m = c;
            }
            if let Some(s) = step {
                params.step_m = s;
            }

            let text = std::fs::read_to_string(&obstacles)
                .with_context(|| format!("Failed to read obstacles: {}", obstacles.display()))?;
            let features = FeatureCollection::from_geojson_str(&text)
                .with_context(|| format!("Invalid obstacle GeoJSON: {}", obstacles.display()))?;
            let obstacles = ObstaclePolygon::from_features(&features);
            info!("{} obstacle polygon(s) loaded", obstacles.len());

            let aoi = route_aoi(&route, params.corridor_width_m);
            let surface = read_raster_aoi(&dsm, aoi)?;
            let ground = dtm.as_deref().map(|p| read_raster_aoi(p, aoi)).transpose()?;

            let start = Instant::now();
            let result = evaluate_route(&route, &obstacles, &surface, ground.as_ref(), &params)
                .context("Clearance evaluation failed")?;
            done("Clearance", start.elapsed());
            info!(
                "{} segment(s): {} pass, {} fail, {} unknown",
                result.summary.segments,
                result.summary.segments - result.summary.fails - result.summary.unknowns,
                result.summary.fails,
                result.summary.unknowns
            );
            emit(&result.to_json(), output.as_deref())?;
        }

        Commands::Subset { input, output, bounds } => {
            let raster = read_raster_aoi(&input, bounds)?;
            let (rows, cols) = raster.shape();
            write_geotiff(&raster, &output).with_context(|| format!("Failed to write: {}", output.display()))?;
            info!("Subset {} x {} written to {}", cols, rows, output.display());
        }

        Commands::Ground {
            input,
            output,
            window,
            sigma,
            method,
        } => {
            let params = GroundParams {
                window_px: window,
                sigma,
                method: method.parse::<GroundMethod>()?,
            };
            let surface = read_raster(&input)?;
            let start = Instant::now();
            let ground = derive_ground(&surface, params).context("Ground derivation failed")?;
            done("Ground", start.elapsed());
            write_geotiff(&ground, &output).with_context(|| format!("Failed to write: {}", output.display()))?;
            info!("Wrote {}", output.display());
        }
    }

    Ok(())
}
