//! Row-parallel execution with a sequential fallback.
//!
//! With the `parallel` feature the grid kernels fan rows out over rayon;
//! without it the same `into_par_iter()` chains resolve to plain iterators,
//! so results are identical either way.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;

use ndarray::Array2;

/// Build a `rows x cols` grid by evaluating `kernel` once per row.
///
/// `kernel(row, out)` fills the row's output slice, which starts as NaN.
pub(crate) fn map_rows<F>(rows: usize, cols: usize, kernel: F) -> Array2<f64>
where
    F: Fn(usize, &mut [f64]) + Sync + Send,
{
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut out = vec![f64::NAN; cols];
            kernel(row, &mut out);
            out
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data)
        .unwrap_or_else(|_| Array2::from_elem((rows, cols), f64::NAN))
}
