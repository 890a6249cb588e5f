//! Shared math utilities.

use ndarray::{s, Array2};

/// Zero-pad a matrix along the row axis up to `rows` rows.
///
/// Matrices that already have `rows` or more rows are returned unchanged.
pub fn pad_rows(m: &Array2<f32>, rows: usize) -> Array2<f32> {
    if m.nrows() >= rows {
        return m.clone();
    }
    let mut padded = Array2::<f32>::zeros((rows, m.ncols()));
    padded.slice_mut(s![..m.nrows(), ..]).assign(m);
    padded
}

/// Row-wise softmax, in place.
///
/// Each row has its maximum subtracted before exponentiation so large logits
/// don't overflow.
pub fn softmax_rows_in_place(m: &mut Array2<f32>) {
    for mut row in m.rows_mut() {
        let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|x| (x - max).exp());
        let sum: f32 = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|x| x / sum);
        }
    }
}

/// Collect `values` into a vector of exactly `len` elements: the first `len`
/// values, zero-filled on the right when there are fewer.
pub fn fit_length(values: impl IntoIterator<Item = f32>, len: usize) -> Vec<f32> {
    let mut out: Vec<f32> = values.into_iter().take(len).collect();
    out.resize(len, 0.0);
    out
}
