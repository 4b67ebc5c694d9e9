//! Buffer operations
//!
//! Round-capped buffers around points and straight segments, approximated
//! as polygons. Route corridors are segment buffers.

use geo::{Coord, Line, LineString, Point, Polygon};
use std::f64::consts::PI;

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer distance; the sign is ignored
    pub distance: f64,
    /// Segments per half circle (default: 16)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 16,
        }
    }
}

/// Circular buffer around a point
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    let n = (params.segments * 2).max(8);
    let r = params.distance.abs();
    let (cx, cy) = (point.x(), point.y());

    let mut coords: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            Coord {
                x: cx + r * angle.cos(),
                y: cy + r * angle.sin(),
            }
        })
        .collect();
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

/// Capsule around a segment: all points within `distance` of it.
///
/// The ring is counter-clockwise. A zero-length segment gives a circle.
pub fn buffer_segment(segment: &Line<f64>, params: &BufferParams) -> Polygon<f64> {
    let (a, b) = (segment.start, segment.end);
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    if len < 1e-12 {
        return buffer_point(&Point::from(a), params);
    }

    let r = params.distance.abs();
    let n = params.segments.max(4);
    // left normal
    let (nx, ny) = (-dy / len, dx / len);
    let base = ny.atan2(nx);

    let arc = |center: Coord<f64>, from: f64| {
        (0..=n).map(move |i| {
            let angle = from + PI * i as f64 / n as f64;
            Coord {
                x: center.x + r * angle.cos(),
                y: center.y + r * angle.sin(),
            }
        })
    };

    // right side a -> b, cap around b, left side b -> a, cap around a
    let mut coords: Vec<Coord<f64>> = arc(b, base + PI).collect();
    coords.extend(arc(a, base));
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}
