//! Exact Euclidean distance transform
//!
//! Two passes of the Felzenszwalb-Huttenlocher lower-envelope transform,
//! first down the columns then along the rows, each with its own spacing.
//! Cells outside the grid count as background.

use ndarray::Array2;

/// Distance from every true cell center to the nearest false cell center.
///
/// `spacing` is `(x, y)`: column spacing then row spacing. False cells get 0.
pub fn distance_transform(mask: &Array2<bool>, spacing: (f64, f64)) -> Array2<f64> {
    let (rows, cols) = mask.dim();
    let (sx, sy) = spacing;
    let (prow, pcol) = (rows + 2, cols + 2);

    // squared distances on a grid with a one-cell background border
    let mut grid = Array2::from_shape_fn((prow, pcol), |(r, c)| {
        let inside = r > 0 && c > 0 && r <= rows && c <= cols && mask[(r - 1, c - 1)];
        if inside {
            f64::INFINITY
        } else {
            0.0
        }
    });

    let mut line = vec![0.0; prow.max(pcol)];
    let mut out = vec![0.0; prow.max(pcol)];

    for c in 0..pcol {
        for r in 0..prow {
            line[r] = grid[(r, c)];
        }
        squared_1d(&line[..prow], sy, &mut out[..prow]);
        for r in 0..prow {
            grid[(r, c)] = out[r];
        }
    }

    for r in 0..prow {
        for c in 0..pcol {
            line[c] = grid[(r, c)];
        }
        squared_1d(&line[..pcol], sx, &mut out[..pcol]);
        for c in 0..pcol {
            grid[(r, c)] = out[c];
        }
    }

    Array2::from_shape_fn((rows, cols), |(r, c)| grid[(r + 1, c + 1)].sqrt())
}

/// One-dimensional squared distance transform of sampled function `f`
fn squared_1d(f: &[f64], h: f64, out: &mut [f64]) {
    let sites: Vec<usize> = (0..f.len()).filter(|&q| f[q].is_finite()).collect();
    if sites.is_empty() {
        out.fill(f64::INFINITY);
        return;
    }

    let pos = |q: usize| q as f64 * h;
    let intersect = |q: usize, p: usize| {
        ((f[q] + pos(q) * pos(q)) - (f[p] + pos(p) * pos(p))) / (2.0 * (pos(q) - pos(p)))
    };

    // parabola apexes and the boundaries between them
    let mut v = vec![0usize; sites.len()];
    let mut z = vec![0.0; sites.len() + 1];
    let mut k = 0;
    v[0] = sites[0];
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for &q in &sites[1..] {
        let mut s = intersect(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, cell) in out.iter_mut().enumerate() {
        while z[k + 1] < pos(q) {
            k += 1;
        }
        let d = pos(q) - pos(v[k]);
        *cell = d * d + f[v[k]];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_border_counts_as_background() {
        let mask = Array2::from_elem((7, 7), true);
        let d = distance_transform(&mask, (1.0, 1.0));
        assert_relative_eq!(d[(3, 3)], 4.0);
        assert_relative_eq!(d[(0, 0)], 1.0);
        assert_relative_eq!(d[(1, 5)], 2.0);
    }

    #[test]
    fn test_interior_hole_diagonal_distance() {
        let mut mask = Array2::from_elem((9, 9), true);
        mask[(4, 4)] = false;
        let d = distance_transform(&mask, (1.0, 1.0));
        assert_eq!(d[(4, 4)], 0.0);
        assert_relative_eq!(d[(4, 6)], 2.0);
        assert_relative_eq!(d[(2, 2)], 8f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_anisotropic_spacing() {
        let mask = Array2::from_elem((5, 5), true);
        // columns 3 m apart, rows 1 m apart: the nearest background is above or below
        let d = distance_transform(&mask, (3.0, 1.0));
        assert_relative_eq!(d[(2, 2)], 3.0);
        assert_relative_eq!(d[(0, 2)], 1.0);
        assert_relative_eq!(d[(2, 0)], 3.0);
    }

    #[test]
    fn test_matches_brute_force() {
        let mask = Array2::from_shape_fn((12, 10), |(r, c)| (r * 7 + c * 3) % 11 != 0);
        let (sx, sy) = (2.0, 1.5);
        let d = distance_transform(&mask, (sx, sy));

        for ((r, c), &got) in d.indexed_iter() {
            let mut best = f64::INFINITY;
            for pr in -1..=12isize {
                for pc in -1..=10isize {
                    let background = pr < 0
                        || pc < 0
                        || pr >= 12
                        || pc >= 10
                        || !mask[(pr as usize, pc as usize)];
                    if background {
                        let dx = (pc - c as isize) as f64 * sx;
                        let dy = (pr - r as isize) as f64 * sy;
                        best = best.min(dx.hypot(dy));
                    }
                }
            }
            assert_relative_eq!(got, best, epsilon = 1e-9);
        }
    }
}
