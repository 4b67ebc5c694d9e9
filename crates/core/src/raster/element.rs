//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Elevation work happens in `f64`; the integer impls exist so that masks and
/// label grids can share the same `Raster` container and TIFF reader.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Value used when a cell cannot be represented (read or cast failure)
    fn fill_value() -> Self;

    /// Whether `self` is no-data given the declared sentinel
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert from f64, saturating to the fill value when out of range
    fn from_f64(value: f64) -> Self {
        NumCast::from(value).unwrap_or_else(Self::fill_value)
    }
}

macro_rules! impl_integer_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.map_or(false, |nd| *self == nd)
            }
        }
    )*};
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn fill_value() -> Self {
                <$t>::NAN
            }

            /// NaN is always no-data; a finite sentinel matches exactly.
            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                self.is_nan() || nodata.map_or(false, |nd| *self == nd)
            }
        }
    )*};
}

impl_integer_element!(i16, i32, u8, u16, u32);
impl_float_element!(f32, f64);
