//! Mask to polygon vectorization
//!
//! Components are 4-connected and numbered in row-major order of their
//! first pixel. Each component's outline is traced along pixel edges with
//! the component kept on the right of travel. Where two of its pixels meet
//! only at a corner the trace turns left, so every ring borders a single
//! 4-connected background region and stays simple; a hole may then touch
//! the exterior at that one corner.

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, Polygon};
use ndarray::Array2;
use std::collections::{HashMap, VecDeque};
use tengri_core::raster::{GeoTransform, Neighborhood};

/// A vectorized connected component
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Outline in world coordinates, exterior counter-clockwise, holes clockwise
    pub polygon: Polygon<f64>,
    /// Number of pixels in the component
    pub pixel_count: usize,
}

/// Label 4-connected true regions of `mask`.
///
/// Returns the label grid (0 = background, components numbered from 1 in
/// row-major order of their first pixel) and the component count.
pub fn label_components(mask: &Array2<bool>) -> (Array2<u32>, usize) {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let neighbors = Neighborhood::Rook.offsets_no_center();
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            if !mask[(row, col)] || labels[(row, col)] != 0 {
                continue;
            }
            next += 1;
            labels[(row, col)] = next;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                for &(dr, dc) in &neighbors {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if mask[(nr, nc)] && labels[(nr, nc)] == 0 {
                        labels[(nr, nc)] = next;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }

    (labels, next as usize)
}

/// Vectorize every 4-connected true region of `mask`
pub fn polygonize(mask: &Array2<bool>, transform: &GeoTransform) -> Vec<Region> {
    let (labels, count) = label_components(mask);
    let mut pixels: Vec<Vec<(usize, usize)>> = vec![Vec::new(); count];
    for ((row, col), &label) in labels.indexed_iter() {
        if label > 0 {
            pixels[label as usize - 1].push((row, col));
        }
    }

    pixels
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| {
            let rings = trace_rings(&labels, i as u32 + 1, cells);
            assemble(rings, transform).map(|polygon| Region {
                polygon,
                pixel_count: cells.len(),
            })
        })
        .collect()
}

type Vertex = (isize, isize);

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    dir: Vertex,
}

impl Edge {
    fn to(&self) -> Vertex {
        (self.from.0 + self.dir.0, self.from.1 + self.dir.1)
    }
}

/// Left turn in `(x, y)` lattice coordinates with y pointing down
fn left(dir: Vertex) -> Vertex {
    (dir.1, -dir.0)
}

/// Closed rings of lattice vertices `(x = col, y = row)` around one component
fn trace_rings(labels: &Array2<u32>, label: u32, cells: &[(usize, usize)]) -> Vec<Vec<Vertex>> {
    let (rows, cols) = labels.dim();
    let inside = |r: isize, c: isize| {
        r >= 0
            && c >= 0
            && r < rows as isize
            && c < cols as isize
            && labels[(r as usize, c as usize)] == label
    };

    let mut edges = Vec::new();
    for &(row, col) in cells {
        let (r, c) = (row as isize, col as isize);
        if !inside(r - 1, c) {
            edges.push(Edge { from: (c, r), dir: (1, 0) });
        }
        if !inside(r, c + 1) {
            edges.push(Edge { from: (c + 1, r), dir: (0, 1) });
        }
        if !inside(r + 1, c) {
            edges.push(Edge { from: (c + 1, r + 1), dir: (-1, 0) });
        }
        if !inside(r, c - 1) {
            edges.push(Edge { from: (c, r + 1), dir: (0, -1) });
        }
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut chain = vec![start];
        used[start] = true;
        let mut current = start;

        loop {
            let edge = edges[current];
            let choices: Vec<usize> = outgoing
                .get(&edge.to())
                .map(|ids| {
                    ids.iter()
                        .copied()
                        .filter(|&id| !used[id] || id == start)
                        .collect()
                })
                .unwrap_or_default();

            let next = match choices.as_slice() {
                [] => break,
                [only] => *only,
                _ => {
                    let turn = left(edge.dir);
                    choices
                        .iter()
                        .copied()
                        .find(|&id| edges[id].dir == turn)
                        .unwrap_or(choices[0])
                }
            };

            if next == start {
                break;
            }
            used[next] = true;
            chain.push(next);
            current = next;
        }

        // Keep only corners
        let n = chain.len();
        let ring: Vec<Vertex> = (0..n)
            .filter(|&k| edges[chain[k]].dir != edges[chain[(k + n - 1) % n]].dir)
            .map(|k| edges[chain[k]].from)
            .collect();
        if ring.len() >= 4 {
            rings.push(ring);
        }
    }

    rings
}

/// Twice the signed area; positive for rings with the component on the right
fn signed_area2(ring: &[Vertex]) -> isize {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum()
}

fn assemble(rings: Vec<Vec<Vertex>>, transform: &GeoTransform) -> Option<Polygon<f64>> {
    let to_world = |ring: &[Vertex]| -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = ring
            .iter()
            .map(|&(x, y)| {
                let (wx, wy) = transform.apply(x as f64, y as f64);
                Coord { x: wx, y: wy }
            })
            .collect();
        coords.push(coords[0]);
        LineString::from(coords)
    };

    let mut exterior: Option<(isize, &Vec<Vertex>)> = None;
    let mut holes = Vec::new();
    for ring in &rings {
        let area = signed_area2(ring);
        if area > 0 {
            if exterior.map_or(true, |(best, _)| area > best) {
                exterior = Some((area, ring));
            }
        } else if area < 0 {
            holes.push(to_world(ring));
        }
    }

    // a negative pixel height mirrors the rings, so wind them in world space
    exterior.map(|(_, ring)| Polygon::new(to_world(ring), holes).orient(Direction::Default))
}
