//! Transformer text encoding.
//!
//! Both the claim and the detected-object label string go through the same
//! encoder. Each call yields one row per token (special tokens included) and
//! one column per hidden unit.
//!
//! # Usage
//!
//! ```rust,ignore
//! use claimcheck_core::encoder::{BertEncoder, TextEncoder};
//!
//! let encoder = BertEncoder::load(&model_path, &tokenizer_path, 512)?;
//! let hidden = encoder.encode("breaking news")?;
//! // hidden is an Array2<f32> of shape (token_count, 768)
//! ```

mod bert;

use ndarray::Array2;

use crate::error::PipelineError;

pub use bert::BertEncoder;

/// Maps a string to its per-token embedding sequence.
pub trait TextEncoder: Send + Sync {
    /// Encode `text` into a `token_count × hidden` matrix.
    fn encode(&self, text: &str) -> Result<Array2<f32>, PipelineError>;
}

/// Model inputs for a single tokenized sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncoderInputs {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncoderInputs {
    /// Build `i64` model inputs from tokenizer output.
    pub fn new(ids: &[u32], attention_mask: &[u32]) -> Self {
        Self {
            input_ids: ids.iter().map(|&id| id as i64).collect(),
            attention_mask: attention_mask.iter().map(|&m| m as i64).collect(),
            token_type_ids: vec![0; ids.len()],
        }
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Tensor shape for every input: `[1, seq]`.
    pub fn shape(&self) -> Vec<i64> {
        vec![1, self.len() as i64]
    }
}
