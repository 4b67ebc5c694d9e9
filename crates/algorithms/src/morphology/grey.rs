//! Grey-level morphology (minimum / maximum filters) on rasters
//!
//! Near the edge the element is clipped to the raster; no-data neighbors are
//! skipped and a no-data center stays no-data.

use crate::maybe_rayon::map_rows;
use ndarray::Array2;
use tengri_core::raster::Raster;
use tengri_core::{Algorithm, Error, Result};

use super::element::StructuringElement;

/// Parameters shared by the grey operators
#[derive(Debug, Clone, Default)]
pub struct GreyParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Grey opening algorithm
#[derive(Debug, Clone, Default)]
pub struct Opening;

impl Algorithm for Opening {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = GreyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Opening"
    }

    fn description(&self) -> &'static str {
        "Grey opening (minimum then maximum filter) to remove features narrower than the element"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        opening(&input, &params.element)
    }
}

/// Minimum filter over the structuring element
pub fn erode(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    element.validate()?;
    let data = filter(&raster.normalized().into_array(), &element.offsets(), f64::min);
    wrap(raster, data)
}

/// Maximum filter over the structuring element
pub fn dilate(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    element.validate()?;
    let data = filter(&raster.normalized().into_array(), &element.offsets(), f64::max);
    wrap(raster, data)
}

/// Erode then dilate: removes bright features smaller than the element
pub fn opening(raster: &Raster<f64>, element: &StructuringElement) -> Result<Raster<f64>> {
    dilate(&erode(raster, element)?, element)
}

fn filter(data: &Array2<f64>, offsets: &[(isize, isize)], pick: fn(f64, f64) -> f64) -> Array2<f64> {
    let (rows, cols) = data.dim();
    map_rows(rows, cols, |row, out| {
        for (col, cell) in out.iter_mut().enumerate() {
            if data[(row, col)].is_nan() {
                continue;
            }
            let mut acc = f64::NAN;
            for &(dr, dc) in offsets {
                let r = row as isize + dr;
                let c = col as isize + dc;
                if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                    continue;
                }
                let v = data[(r as usize, c as usize)];
                if v.is_nan() {
                    continue;
                }
                acc = if acc.is_nan() { v } else { pick(acc, v) };
            }
            *cell = acc;
        }
    })
}

fn wrap(template: &Raster<f64>, data: Array2<f64>) -> Result<Raster<f64>> {
    let mut out = template.with_same_grid(data)?;
    out.set_nodata(Some(f64::NAN));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tengri_core::GeoTransform;

    fn make_raster(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        Raster::filled(rows, cols, value).with_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0))
    }

    #[test]
    fn test_erode_picks_minimum_up_to_edge() {
        let mut raster = make_raster(7, 7, 10.0);
        raster.set(0, 1, 2.0).unwrap();
        let result = erode(&raster, &StructuringElement::Square(1)).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 2.0);
        assert_eq!(result.get(1, 2).unwrap(), 2.0);
        assert_eq!(result.get(3, 3).unwrap(), 10.0);
    }

    #[test]
    fn test_dilate_skips_nodata() {
        let mut raster = make_raster(5, 5, 1.0).with_nodata(-9999.0);
        raster.set(2, 2, -9999.0).unwrap();
        raster.set(2, 3, 7.0).unwrap();
        let result = dilate(&raster, &StructuringElement::Cross(1)).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert_eq!(result.get(1, 3).unwrap(), 7.0);
        assert_eq!(result.get(2, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_opening_removes_small_bump() {
        let mut raster = make_raster(11, 11, 5.0);
        for r in 4..6 {
            for c in 4..6 {
                raster.set(r, c, 30.0).unwrap();
            }
        }
        let result = opening(&raster, &StructuringElement::Square(2)).unwrap();
        assert!(result.data().iter().all(|v| *v == 5.0));
    }
}
