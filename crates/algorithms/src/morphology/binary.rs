//! Binary morphology on boolean masks
//!
//! Cells outside the grid count as background. Opening and closing run on a
//! copy padded by the element radius, so closing never trims and opening
//! never grows a region that touches the raster edge.

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tengri_core::{Error, Result};

use super::element::StructuringElement;

/// Single refinement pass applied to a mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Morphology {
    /// Dilate then erode: merges close regions and fills notches
    #[default]
    Closing,
    /// Erode then dilate: drops specks and cuts thin bridges
    Opening,
}

impl Morphology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Morphology::Closing => "closing",
            Morphology::Opening => "opening",
        }
    }

    /// Apply this pass to `mask`
    pub fn apply(&self, mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
        match self {
            Morphology::Closing => binary_closing(mask, element),
            Morphology::Opening => binary_opening(mask, element),
        }
    }
}

impl fmt::Display for Morphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Morphology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closing" => Ok(Morphology::Closing),
            "opening" => Ok(Morphology::Opening),
            other => Err(Error::invalid_parameter(
                "morphology",
                other,
                "expected 'closing' or 'opening'",
            )),
        }
    }
}

/// Cell stays true only if every cell under the element is true
pub fn binary_erode(mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
    element.validate()?;
    Ok(sweep(mask, &element.offsets(), true))
}

/// Cell becomes true if any cell under the element is true
pub fn binary_dilate(mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
    element.validate()?;
    Ok(sweep(mask, &element.offsets(), false))
}

pub fn binary_opening(mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
    element.validate()?;
    let offsets = element.offsets();
    let r = element.radius();
    let padded = pad(mask, r);
    let out = sweep(&sweep(&padded, &offsets, true), &offsets, false);
    Ok(crop(&out, r, mask.dim()))
}

pub fn binary_closing(mask: &Array2<bool>, element: &StructuringElement) -> Result<Array2<bool>> {
    element.validate()?;
    let offsets = element.offsets();
    let r = element.radius();
    let padded = pad(mask, r);
    let out = sweep(&sweep(&padded, &offsets, false), &offsets, true);
    Ok(crop(&out, r, mask.dim()))
}

/// One erosion (`all`) or dilation (`!all`) pass
fn sweep(mask: &Array2<bool>, offsets: &[(isize, isize)], all: bool) -> Array2<bool> {
    let (rows, cols) = mask.dim();
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let mut hits = offsets.iter().map(|&(dr, dc)| {
            let r = row as isize + dr;
            let c = col as isize + dc;
            r >= 0
                && c >= 0
                && r < rows as isize
                && c < cols as isize
                && mask[(r as usize, c as usize)]
        });
        if all {
            hits.all(|v| v)
        } else {
            hits.any(|v| v)
        }
    })
}

fn pad(mask: &Array2<bool>, r: usize) -> Array2<bool> {
    let (rows, cols) = mask.dim();
    let mut out = Array2::from_elem((rows + 2 * r, cols + 2 * r), false);
    out.slice_mut(s![r..r + rows, r..r + cols]).assign(mask);
    out
}

fn crop(mask: &Array2<bool>, r: usize, (rows, cols): (usize, usize)) -> Array2<bool> {
    mask.slice(s![r..r + rows, r..r + cols]).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(rows: usize, cols: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> Array2<bool> {
        Array2::from_shape_fn((rows, cols), |(r, c)| r >= r0 && r < r1 && c >= c0 && c < c1)
    }

    #[test]
    fn test_erode_shrinks_by_cross() {
        let mask = block(9, 9, 2, 7, 2, 7);
        let out = binary_erode(&mask, &StructuringElement::Cross(1)).unwrap();
        assert_eq!(out.iter().filter(|v| **v).count(), 9);
        assert!(out[(4, 4)]);
        assert!(!out[(2, 2)]);
    }

    #[test]
    fn test_outside_counts_as_background() {
        let mask = Array2::from_elem((5, 5), true);
        let out = binary_erode(&mask, &StructuringElement::Cross(1)).unwrap();
        assert_eq!(out, block(5, 5, 1, 4, 1, 4));
    }

    #[test]
    fn test_closing_and_opening_keep_edge_region() {
        let mask = block(8, 8, 0, 4, 0, 8);
        let cross = StructuringElement::Cross(1);
        assert_eq!(binary_closing(&mask, &cross).unwrap(), mask);

        let opened = binary_opening(&mask, &cross).unwrap();
        assert!(opened[(0, 3)]);
        assert!(opened.iter().zip(mask.iter()).all(|(o, m)| !*o || *m));
    }

    #[test]
    fn test_closing_fills_single_hole() {
        let mut mask = block(9, 9, 1, 8, 1, 8);
        mask[(4, 4)] = false;
        let out = binary_closing(&mask, &StructuringElement::Cross(1)).unwrap();
        assert!(out[(4, 4)]);
        assert_eq!(out, block(9, 9, 1, 8, 1, 8));
    }

    #[test]
    fn test_opening_removes_speck_and_keeps_block() {
        let mut mask = block(12, 12, 5, 10, 5, 10);
        mask[(1, 1)] = true;
        let out = binary_opening(&mask, &StructuringElement::Cross(1)).unwrap();
        assert!(!out[(1, 1)]);
        assert!(out[(7, 7)]);
    }

    #[test]
    fn test_opening_cuts_thin_bridge() {
        // two 3x3 blocks joined by a three-cell, one-cell-wide bridge
        let mut mask = Array2::from_elem((5, 11), false);
        for r in 1..4 {
            for c in (1..4).chain(7..10) {
                mask[(r, c)] = true;
            }
        }
        for c in 4..7 {
            mask[(2, c)] = true;
        }
        let out = binary_opening(&mask, &StructuringElement::Cross(1)).unwrap();
        assert!(!out[(2, 5)]);
        assert!(out[(2, 2)] && out[(2, 8)]);
    }

    #[test]
    fn test_morphology_from_str() {
        assert_eq!("closing".parse::<Morphology>().unwrap(), Morphology::Closing);
        assert_eq!(" Opening ".parse::<Morphology>().unwrap(), Morphology::Opening);
        assert!("dilation".parse::<Morphology>().is_err());
        assert_eq!(Morphology::default().to_string(), "closing");
    }
}
