//! BERT ONNX encoder returning the last hidden state.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;
use tokenizers::{Tokenizer, TruncationParams};

use super::{EncoderInputs, TextEncoder};
use crate::error::PipelineError;

/// BERT-style text encoder wrapper.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct BertEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    /// Whether the graph declares a `token_type_ids` input.
    uses_token_types: bool,
}

impl BertEncoder {
    /// Load the encoder graph and its `tokenizer.json`.
    ///
    /// Tokenized sequences are truncated to `max_length` tokens.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_length: usize,
    ) -> Result<Self, PipelineError> {
        for path in [model_path, tokenizer_path] {
            if !path.exists() {
                return Err(PipelineError::Model {
                    path: path.to_path_buf(),
                    message: "File not found. Run `claimcheck models download` first.".to_string(),
                });
            }
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to load text encoder model: {e}"),
            })?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| PipelineError::Model {
            path: tokenizer_path.to_path_buf(),
            message: format!("Failed to load tokenizer: {e}"),
        })?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| PipelineError::Model {
                path: tokenizer_path.to_path_buf(),
                message: format!("Failed to configure truncation: {e}"),
            })?;

        let uses_token_types = session
            .inputs()
            .iter()
            .any(|i| i.name() == "token_type_ids");

        tracing::debug!(
            "Loaded text encoder from {:?} (inputs: {:?}, outputs: {:?})",
            model_path,
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            uses_token_types,
        })
    }

    fn tokenize(&self, text: &str) -> Result<EncoderInputs, PipelineError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::TextEncoding {
                message: format!("Tokenization failed: {e}"),
            })?;
        Ok(EncoderInputs::new(
            encoding.get_ids(),
            encoding.get_attention_mask(),
        ))
    }
}

impl TextEncoder for BertEncoder {
    fn encode(&self, text: &str) -> Result<Array2<f32>, PipelineError> {
        let inputs = self.tokenize(text)?;
        let shape = inputs.shape();
        let seq_len = inputs.len();

        let tensor = |data: Vec<i64>| {
            Value::from_array((shape.clone(), data)).map_err(|e| PipelineError::TextEncoding {
                message: format!("Failed to create input tensor: {e}"),
            })
        };
        let input_ids = tensor(inputs.input_ids)?;
        let attention_mask = tensor(inputs.attention_mask)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PipelineError::TextEncoding {
                message: format!("Text encoder lock poisoned: {e}"),
            })?;

        let outputs = if self.uses_token_types {
            let token_type_ids = tensor(inputs.token_type_ids)?;
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        }
        .map_err(|e| PipelineError::TextEncoding {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        // Prefer last_hidden_state by name; exports that rename it keep it first.
        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| PipelineError::TextEncoding {
                message: "Text encoder produced no outputs".to_string(),
            })?;

        let (shape, data) =
            hidden
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::TextEncoding {
                    message: format!("Failed to extract last_hidden_state: {e}"),
                })?;

        // last_hidden_state is [1, seq, hidden].
        let (rows, cols) = match shape.len() {
            3 => (shape[1] as usize, shape[2] as usize),
            2 => (shape[0] as usize, shape[1] as usize),
            _ => {
                return Err(PipelineError::TextEncoding {
                    message: format!("Unexpected last_hidden_state shape: {:?}", shape),
                });
            }
        };
        if rows != seq_len || data.len() < rows * cols {
            return Err(PipelineError::TextEncoding {
                message: format!(
                    "last_hidden_state shape {:?} does not match {} input tokens",
                    shape, seq_len
                ),
            });
        }

        Array2::from_shape_vec((rows, cols), data[..rows * cols].to_vec()).map_err(|e| {
            PipelineError::TextEncoding {
                message: format!("Failed to shape hidden states: {e}"),
            }
        })
    }
}
