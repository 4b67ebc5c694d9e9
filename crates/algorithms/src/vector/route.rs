//! Arc-length sampling of a route polyline

use geo::{Euclidean, Length, LineInterpolatePoint, LineString, Point};
use tengri_core::{Error, Result};

/// Samples closer than this to the route end count as the end itself
const TERMINAL_TOLERANCE: f64 = 1e-6;

/// Sample `route` every `step` map units of arc length.
///
/// Samples sit at `0, step, 2*step, ...` up to the total length, plus the
/// exact end point unless the last regular sample already lies within
/// `1e-6` of it.
pub fn sample_route(route: &LineString<f64>, step: f64) -> Result<Vec<Point<f64>>> {
    if route.0.len() < 2 {
        return Err(Error::invalid_parameter(
            "route",
            route.0.len(),
            "route needs at least two points",
        ));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(Error::invalid_parameter("step", step, "step must be positive"));
    }

    let total = route.length::<Euclidean>();
    let Some(&first) = route.0.first() else {
        return Ok(Vec::new());
    };
    if total <= 0.0 {
        return Ok(vec![Point::from(first)]);
    }

    let count = (total / step).floor() as usize;
    let mut samples: Vec<Point<f64>> = std::iter::once(Point::from(first))
        .chain((1..=count).filter_map(|i| route.line_interpolate_point(i as f64 * step / total)))
        .collect();

    if let (Some(last), Some(end)) = (samples.last(), route.0.last()) {
        if (last.x() - end.x).hypot(last.y() - end.y) > TERMINAL_TOLERANCE {
            samples.push(Point::from(*end));
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_multiple_has_no_extra_terminal() {
        let route = LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]);
        let samples = sample_route(&route, 25.0).unwrap();
        assert_eq!(samples.len(), 5);
        assert_relative_eq!(samples[4].x(), 100.0);
    }

    #[test]
    fn test_terminal_point_appended() {
        let route = LineString::from(vec![(0.0, 0.0), (103.0, 0.0)]);
        let samples = sample_route(&route, 25.0).unwrap();
        assert_eq!(samples.len(), 6);
        assert_relative_eq!(samples[5].x(), 103.0);
    }

    #[test]
    fn test_samples_follow_bends() {
        let route = LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let samples = sample_route(&route, 4.0).unwrap();
        // 0, 4, 8, 12, 16, 20
        assert_eq!(samples.len(), 6);
        assert_relative_eq!(samples[3].x(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(samples[3].y(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(samples[5].y(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_repeated_vertices_are_skipped() {
        let route = LineString::from(vec![(0.0, 0.0), (0.0, 0.0), (6.0, 0.0), (6.0, 0.0), (6.0, 8.0)]);
        let samples = sample_route(&route, 5.0).unwrap();
        // 0, 5, 10, 14
        assert_eq!(samples.len(), 4);
        assert_relative_eq!(samples[1].x(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(samples[2].x(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(samples[2].y(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(samples[3].y(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_length_route_gives_one_sample() {
        let route = LineString::from(vec![(5.0, 5.0), (5.0, 5.0)]);
        assert_eq!(sample_route(&route, 10.0).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_inputs() {
        let single = LineString::from(vec![(0.0, 0.0)]);
        assert!(sample_route(&single, 1.0).is_err());
        let route = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        assert!(sample_route(&route, 0.0).is_err());
        assert!(sample_route(&route, f64::NAN).is_err());
    }
}
