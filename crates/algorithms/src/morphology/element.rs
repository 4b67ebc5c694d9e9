//! Structuring element definitions for morphological operations

use tengri_core::raster::Neighborhood;
use tengri_core::{Error, Result};

/// Shape of a structuring element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Square element of given radius (side = 2*radius + 1)
    Square(usize),
    /// Plus-shaped element of given arm length
    Cross(usize),
    /// Disk element of given radius; `Disk(1)` equals `Cross(1)`
    Disk(usize),
}

impl Default for StructuringElement {
    /// The 4-connected unit cross, matching the labeling connectivity
    fn default() -> Self {
        StructuringElement::Cross(1)
    }
}

impl StructuringElement {
    /// Validate the structuring element, returning an error for invalid configurations
    pub fn validate(&self) -> Result<()> {
        if self.radius() == 0 {
            return Err(Error::invalid_parameter(
                "radius",
                0,
                "structuring element radius must be at least 1",
            ));
        }
        Ok(())
    }

    /// Get the radius of the structuring element
    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Square(r)
            | StructuringElement::Cross(r)
            | StructuringElement::Disk(r) => *r,
        }
    }

    /// `(dr, dc)` offsets relative to the center for all active cells
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        match self {
            StructuringElement::Square(r) => Neighborhood::Square(*r).offsets(),
            StructuringElement::Disk(r) => Neighborhood::Circle(*r).offsets(),
            StructuringElement::Cross(r) => {
                let r = *r as isize;
                Neighborhood::Square(r as usize)
                    .offsets()
                    .into_iter()
                    .filter(|&(dr, dc)| dr == 0 || dc == 0)
                    .collect()
            }
        }
    }
}
