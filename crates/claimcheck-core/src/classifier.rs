//! Real/fake classifier over fused feature vectors.
//!
//! The classifier is an ONNX export of the trained model. It takes a
//! `1 × feature_width` batch and returns `[score_fake, score_real]` in its
//! first output.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// Scores a fused feature vector.
pub trait Classifier: Send + Sync {
    /// Return `[score_fake, score_real]` for a single-row batch.
    fn classify(&self, features: &Array2<f32>) -> Result<[f32; 2], PipelineError>;
}

/// Take the first two values of a classifier output as `[fake, real]`.
pub fn scores_from_output(data: &[f32]) -> Result<[f32; 2], PipelineError> {
    match data {
        [fake, real, ..] => Ok([*fake, *real]),
        _ => Err(PipelineError::Classification {
            message: format!("expected at least 2 scores, got {}", data.len()),
        }),
    }
}

/// Wraps an ONNX Runtime session for the trained classifier.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl OnnxClassifier {
    /// Load the classifier from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::Model {
                path: model_path.to_path_buf(),
                message: "Classifier model not found. Export the trained model to ONNX and place it here."
                    .to_string(),
            });
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to load classifier model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Loaded classifier from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &Array2<f32>) -> Result<[f32; 2], PipelineError> {
        let shape: Vec<i64> = features.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = features.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Classification {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| PipelineError::Classification {
                message: format!("Session lock poisoned: {e}"),
            })?;

        let outputs = session
            .run(inputs)
            .map_err(|e| PipelineError::Classification {
                message: format!("ONNX inference failed: {e}"),
            })?;

        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| PipelineError::Classification {
                message: "Classifier produced no outputs".to_string(),
            })?;

        let (_shape, data) =
            output
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Classification {
                    message: format!("Failed to extract scores: {e}"),
                })?;

        scores_from_output(data)
    }
}
