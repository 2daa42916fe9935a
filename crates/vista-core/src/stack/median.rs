use std::cmp::Ordering;

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, VistaError};
use crate::frame::Pixel;

/// Per-pixel median across `frames`.
///
/// Even counts average the two middle values. A pixel whose inputs contain
/// NaN is NaN in the output. Inputs are only read; each pixel column is
/// copied into a scratch buffer before selection.
///
/// Uses `select_nth_unstable` for O(n) median without full sort.
/// Parallelizes at the row level for images >= 256x256.
pub fn median_frames<T: Pixel>(frames: &[ArrayView2<'_, T>]) -> Result<Array2<T>> {
    let first = frames.first().ok_or(VistaError::EmptySequence)?;
    let (h, w) = first.dim();

    if let Some(bad) = frames.iter().find(|f| f.dim() != (h, w)) {
        return Err(VistaError::ShapeMismatch {
            expected: (h, w),
            found: bad.dim(),
        });
    }

    let n = frames.len();

    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        // Row-parallel: each row allocates its own pixel_values
        let rows: Vec<Vec<T>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut pixel_values = vec![T::zero(); n];
                let mut row_result = vec![T::zero(); w];
                for (col, result) in row_result.iter_mut().enumerate() {
                    for (i, frame) in frames.iter().enumerate() {
                        pixel_values[i] = frame[[row, col]];
                    }
                    *result = compute_median(&mut pixel_values);
                }
                row_result
            })
            .collect();

        Array2::from_shape_vec((h, w), rows.concat())
            .map_err(|e| VistaError::Processing(e.to_string()))
    } else {
        let mut result = Array2::<T>::zeros((h, w));
        let mut pixel_values = vec![T::zero(); n];

        for row in 0..h {
            for col in 0..w {
                for (i, frame) in frames.iter().enumerate() {
                    pixel_values[i] = frame[[row, col]];
                }
                result[[row, col]] = compute_median(&mut pixel_values);
            }
        }
        Ok(result)
    }
}

fn cmp_pixels<T: Pixel>(a: &T, b: &T) -> Ordering {
    // NaN never reaches here
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn compute_median<T: Pixel>(pixel_values: &mut [T]) -> T {
    let n = pixel_values.len();
    if pixel_values.iter().any(|v| v.is_nan()) {
        return T::nan();
    }

    if n == 1 {
        pixel_values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *pixel_values.select_nth_unstable_by(mid, cmp_pixels::<T>).1
    } else {
        let mid = n / 2;
        pixel_values.select_nth_unstable_by(mid, cmp_pixels::<T>);
        pixel_values[..mid].select_nth_unstable_by(mid - 1, cmp_pixels::<T>);
        (pixel_values[mid - 1] + pixel_values[mid]) / (T::one() + T::one())
    }
}
