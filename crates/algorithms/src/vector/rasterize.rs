//! Polygon to mask rasterization
//!
//! A pixel is inside when its center is inside the polygon (even-odd rule
//! over the exterior and all holes). For polygons traced from pixel edges
//! this reproduces the source component exactly.

use geo::Polygon;
use ndarray::Array2;
use tengri_core::raster::GeoTransform;

/// Burn `polygon` into a `rows x cols` mask on the grid described by `transform`
pub fn rasterize(polygon: &Polygon<f64>, transform: &GeoTransform, rows: usize, cols: usize) -> Array2<bool> {
    let mut mask = Array2::from_elem((rows, cols), false);

    let edges: Vec<((f64, f64), (f64, f64))> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .flat_map(|ring| {
            ring.lines().map(|line| {
                (
                    transform.geo_to_pixel(line.start.x, line.start.y),
                    transform.geo_to_pixel(line.end.x, line.end.y),
                )
            })
        })
        .filter(|((x0, y0), (x1, y1))| x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite())
        .collect();
    if edges.is_empty() {
        return mask;
    }

    let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), ((_, y0), (_, y1))| {
        (lo.min(y0.min(*y1)), hi.max(y0.max(*y1)))
    });
    let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
    let last_row = (max_y - 0.5).floor().min(rows as f64 - 1.0);
    if last_row < first_row as f64 {
        return mask;
    }

    let mut crossings = Vec::new();
    for row in first_row..=last_row as usize {
        let y = row as f64 + 0.5;
        crossings.clear();
        for &((x0, y0), (x1, y1)) in &edges {
            if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0);
            let end = (pair[1] - 0.5).ceil().min(cols as f64);
            if end <= start {
                continue;
            }
            for col in start as usize..end as usize {
                mask[(row, col)] = true;
            }
        }
    }

    mask
}
