//! Cross-attention fusion of claim and detected-object embeddings.
//!
//! The classifier was trained on a fixed-width vector built from two
//! variable-length embedding sequences:
//!
//! ```text
//! T (claim tokens × H), O (object tokens × H)
//!   → zero-pad both to max_len rows
//!   → softmax(O_pad · T_padᵀ / sqrt(H)) · T_pad     (max_len × H)
//!   → flatten row-major
//!   → zero-pad / truncate to FEATURE_WIDTH
//!   → 1 × FEATURE_WIDTH
//! ```
//!
//! `H` is the column count of the padded claim matrix. Changing any step,
//! including the scaling denominator, shifts the input distribution the
//! classifier was trained on.

use ndarray::Array2;

use crate::error::{PipelineError, PipelineResult};
use crate::math::{fit_length, pad_rows, softmax_rows_in_place};

/// Input width of the trained classifier.
pub const FEATURE_WIDTH: usize = 23040;

/// Scaled dot-product attention with the object sequence as queries and the
/// claim sequence as keys and values.
///
/// Returns a `max_len × H` matrix in standard (row-major) layout.
pub fn cross_attention(text: &Array2<f32>, objects: &Array2<f32>) -> PipelineResult<Array2<f32>> {
    if text.ncols() != objects.ncols() {
        return Err(PipelineError::Fusion {
            message: format!(
                "hidden width mismatch: claim embeddings have {} columns, object embeddings have {}",
                text.ncols(),
                objects.ncols()
            ),
        });
    }
    if text.ncols() == 0 {
        return Err(PipelineError::Fusion {
            message: "embeddings have zero hidden width".to_string(),
        });
    }

    let max_len = text.nrows().max(objects.nrows());
    let text_padded = pad_rows(text, max_len);
    let objects_padded = pad_rows(objects, max_len);

    let scale = (text_padded.ncols() as f64).sqrt() as f32;
    let mut weights = objects_padded.dot(&text_padded.t()) / scale;
    softmax_rows_in_place(&mut weights);

    Ok(weights.dot(&text_padded))
}

/// Builds classifier input vectors of a fixed width.
#[derive(Debug, Clone)]
pub struct FeatureFuser {
    width: usize,
}

impl Default for FeatureFuser {
    fn default() -> Self {
        Self::new(FEATURE_WIDTH)
    }
}

impl FeatureFuser {
    /// Create a fuser producing `1 × width` vectors.
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Width of the vectors this fuser produces.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Fuse claim and object embeddings into a single-row batch.
    pub fn fuse(&self, text: &Array2<f32>, objects: &Array2<f32>) -> PipelineResult<Array2<f32>> {
        let attended = cross_attention(text, objects)?;
        let flat_len = attended.len();
        let values = fit_length(attended.iter().copied(), self.width);

        tracing::trace!(
            "Fused {}x{} attention output ({} values) into {} features",
            attended.nrows(),
            attended.ncols(),
            flat_len,
            self.width
        );

        Array2::from_shape_vec((1, self.width), values).map_err(|e| PipelineError::Fusion {
            message: format!("Failed to shape fused vector: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ramp(rows: usize, cols: usize) -> Array2<f32> {
        Array2::from_shape_fn((rows, cols), |(r, c)| ((r * cols + c) % 17) as f32 * 0.01)
    }

    #[test]
    fn test_output_is_single_row_of_feature_width() {
        let fuser = FeatureFuser::default();
        let fused = fuser.fuse(&ramp(6, 768), &ramp(2, 768)).unwrap();
        assert_eq!(fused.shape(), &[1, FEATURE_WIDTH]);
    }

    #[test]
    fn test_short_attention_output_is_zero_padded() {
        // 6 x 768 = 4608 values, the rest must be zeros.
        let fuser = FeatureFuser::default();
        let fused = fuser.fuse(&ramp(6, 768), &ramp(2, 768)).unwrap();
        assert!(fused.iter().skip(6 * 768).all(|&v| v == 0.0));
        assert!(fused.iter().take(6 * 768).any(|&v| v != 0.0));
    }

    #[test]
    fn test_long_attention_output_is_truncated() {
        // 40 x 768 = 30720 values > 23040.
        let fuser = FeatureFuser::default();
        let text = ramp(40, 768);
        let fused = fuser.fuse(&text, &ramp(3, 768)).unwrap();
        assert_eq!(fused.len(), FEATURE_WIDTH);

        let full = cross_attention(&text, &ramp(3, 768)).unwrap();
        let expected: Vec<f32> = full.iter().copied().take(FEATURE_WIDTH).collect();
        assert_eq!(fused.iter().copied().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_attention_shape_uses_longer_sequence() {
        let attended = cross_attention(&ramp(3, 4), &ramp(7, 4)).unwrap();
        assert_eq!(attended.shape(), &[7, 4]);

        let attended = cross_attention(&ramp(9, 4), &ramp(2, 4)).unwrap();
        assert_eq!(attended.shape(), &[9, 4]);
    }

    #[test]
    fn test_scaling_uses_padded_hidden_width() {
        // O_pad row 0 = [2,0,0,0] scores [2, 0] / sqrt(4) = [1, 0].
        let text = array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
        let objects = array![[2.0, 0.0, 0.0, 0.0]];
        let attended = cross_attention(&text, &objects).unwrap();

        let e = std::f32::consts::E;
        assert!((attended[[0, 0]] - e / (e + 1.0)).abs() < 1e-6);
        assert!((attended[[0, 1]] - 1.0 / (e + 1.0)).abs() < 1e-6);
        // The zero padding row of O attends uniformly.
        assert!((attended[[1, 0]] - 0.5).abs() < 1e-6);
        assert!((attended[[1, 1]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_padding_rows_of_claim_receive_attention() {
        // T_pad = [[1,0],[0,0],[0,0]]; a zero query attends 1/3 to each row.
        let text = array![[1.0, 0.0]];
        let objects = array![[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]];
        let attended = cross_attention(&text, &objects).unwrap();
        assert_eq!(attended.shape(), &[3, 2]);
        assert!((attended[[0, 0]] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(attended[[0, 1]], 0.0);
    }

    #[test]
    fn test_identical_claim_rows_pass_through() {
        let text = array![[0.5, -1.0, 2.0], [0.5, -1.0, 2.0]];
        let objects = array![[3.0, 1.0, 0.0], [-1.0, 0.0, 4.0]];
        let attended = cross_attention(&text, &objects).unwrap();
        for row in attended.rows() {
            assert!((row[0] - 0.5).abs() < 1e-6);
            assert!((row[1] + 1.0).abs() < 1e-6);
            assert!((row[2] - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_small_width_pads_and_truncates() {
        let text = array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
        let objects = array![[2.0, 0.0, 0.0, 0.0]];
        let e = std::f32::consts::E;

        let padded = FeatureFuser::new(10).fuse(&text, &objects).unwrap();
        assert_eq!(padded.shape(), &[1, 10]);
        assert_eq!(padded[[0, 8]], 0.0);
        assert_eq!(padded[[0, 9]], 0.0);

        let truncated = FeatureFuser::new(3).fuse(&text, &objects).unwrap();
        assert_eq!(truncated.shape(), &[1, 3]);
        assert!((truncated[[0, 0]] - e / (e + 1.0)).abs() < 1e-6);
        assert!((truncated[[0, 1]] - 1.0 / (e + 1.0)).abs() < 1e-6);
        assert_eq!(truncated[[0, 2]], 0.0);
    }

    #[test]
    fn test_fusion_is_deterministic() {
        let fuser = FeatureFuser::default();
        let text = ramp(11, 768);
        let objects = ramp(4, 768);
        let a = fuser.fuse(&text, &objects).unwrap();
        let b = fuser.fuse(&text, &objects).unwrap();
        let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn test_hidden_width_mismatch_is_an_error() {
        let err = cross_attention(&ramp(2, 768), &ramp(2, 512)).unwrap_err();
        assert!(matches!(err, PipelineError::Fusion { .. }));
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn test_zero_hidden_width_is_an_error() {
        let empty = Array2::<f32>::zeros((2, 0));
        assert!(cross_attention(&empty, &empty).is_err());
    }
}
