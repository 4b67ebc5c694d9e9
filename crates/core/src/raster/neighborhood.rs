//! Cell neighborhoods used by labeling and morphology

/// Pattern of cells around a center cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// Center plus the 4 edge-sharing neighbors
    Rook,
    /// Center plus all 8 surrounding neighbors
    Queen,
    /// Square of the given radius in cells
    Square(usize),
    /// Disk of the given radius in cells
    Circle(usize),
}

impl Neighborhood {
    /// Reach of the pattern in cells
    pub fn radius(&self) -> usize {
        match self {
            Neighborhood::Rook | Neighborhood::Queen => 1,
            Neighborhood::Square(r) | Neighborhood::Circle(r) => *r,
        }
    }

    /// Whether the relative position `(dr, dc)` belongs to the pattern
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        match self {
            Neighborhood::Rook => dr.abs() + dc.abs() <= 1,
            Neighborhood::Queen => dr.abs() <= 1 && dc.abs() <= 1,
            Neighborhood::Square(r) => {
                let r = *r as isize;
                dr.abs() <= r && dc.abs() <= r
            }
            Neighborhood::Circle(r) => {
                let r = *r as isize;
                dr * dr + dc * dc <= r * r
            }
        }
    }

    /// Relative `(dr, dc)` positions in row-major order, center included
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        (-r..=r)
            .flat_map(|dr| (-r..=r).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| self.contains(dr, dc))
            .collect()
    }

    /// Relative positions without the center cell
    pub fn offsets_no_center(&self) -> Vec<(isize, isize)> {
        self.offsets()
            .into_iter()
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .collect()
    }
}
