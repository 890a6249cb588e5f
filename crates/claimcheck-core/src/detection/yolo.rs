//! YOLO ONNX session management and output decoding.
//!
//! Works with YOLOv3-style exports whose outputs are rows of
//! `[cx, cy, w, h, objectness, class scores...]`, one output per detection
//! scale (or a single concatenated output). Only the class scores are used.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ort::session::Session;
use ort::value::Value;

use super::preprocess::preprocess;
use super::ObjectDetector;
use crate::error::PipelineError;

/// Columns preceding the class scores in each detection row.
const BOX_COLUMNS: usize = 5;

/// Collect the arg-max class id of every detection row whose best class score
/// is strictly above `threshold`.
///
/// `data` is a flat run of rows, each `5 + num_classes` wide.
pub fn collect_class_ids(
    data: &[f32],
    num_classes: usize,
    threshold: f32,
    class_ids: &mut BTreeSet<usize>,
) -> Result<(), PipelineError> {
    let row_width = BOX_COLUMNS + num_classes;
    if num_classes == 0 || data.len() % row_width != 0 {
        return Err(PipelineError::Detection {
            message: format!(
                "detector output of {} values is not a whole number of {}-wide rows",
                data.len(),
                row_width
            ),
        });
    }

    for row in data.chunks_exact(row_width) {
        let scores = &row[BOX_COLUMNS..];
        // First maximum wins on ties.
        let (class_id, confidence) = scores.iter().enumerate().fold(
            (0, f32::NEG_INFINITY),
            |best, (i, &s)| if s > best.1 { (i, s) } else { best },
        );
        if confidence > threshold {
            class_ids.insert(class_id);
        }
    }

    Ok(())
}

/// Wraps an ONNX Runtime session for YOLO object detection.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct YoloDetector {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    input_size: u32,
    num_classes: usize,
    threshold: f32,
}

impl YoloDetector {
    /// Load a YOLO detector from an ONNX file.
    pub fn load(
        model_path: &Path,
        input_size: u32,
        num_classes: usize,
        threshold: f32,
    ) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::Model {
                path: model_path.to_path_buf(),
                message: "Detector model not found. Export YOLOv3 to ONNX and place it here."
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
                message: format!("Failed to load detector model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "images".to_string());

        tracing::debug!(
            "Loaded detector from {:?} (input: {:?}, outputs: {:?}, classes: {})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>(),
            num_classes
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            input_size,
            num_classes,
            threshold,
        })
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, image: &DynamicImage) -> Result<BTreeSet<usize>, PipelineError> {
        let tensor = preprocess(image, self.input_size);
        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Detection {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| PipelineError::Detection {
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| PipelineError::Detection {
            message: format!("ONNX inference failed: {e}"),
        })?;

        let mut class_ids = BTreeSet::new();
        for (name, value) in outputs.iter() {
            let (_shape, data) =
                value
                    .try_extract_tensor::<f32>()
                    .map_err(|e| PipelineError::Detection {
                        message: format!("Failed to extract output {name:?}: {e}"),
                    })?;
            collect_class_ids(data, self.num_classes, self.threshold, &mut class_ids)?;
        }

        tracing::debug!("Detected {} distinct classes", class_ids.len());
        Ok(class_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One detection row with 3 classes.
    fn row(scores: [f32; 3]) -> Vec<f32> {
        let mut r = vec![0.5, 0.5, 0.1, 0.1, 0.9];
        r.extend_from_slice(&scores);
        r
    }

    #[test]
    fn test_keeps_argmax_above_threshold() {
        let data = [row([0.1, 0.8, 0.75]), row([0.95, 0.0, 0.0])].concat();
        let mut ids = BTreeSet::new();
        collect_class_ids(&data, 3, 0.7, &mut ids).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let data = row([0.7, 0.2, 0.1]);
        let mut ids = BTreeSet::new();
        collect_class_ids(&data, 3, 0.7, &mut ids).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_only_argmax_class_is_considered() {
        // Class 2 clears the threshold but class 1 is higher; only 1 is kept.
        let data = row([0.0, 0.9, 0.8]);
        let mut ids = BTreeSet::new();
        collect_class_ids(&data, 3, 0.7, &mut ids).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_objectness_is_ignored() {
        let mut data = row([0.0, 0.0, 0.71]);
        data[4] = 0.0;
        let mut ids = BTreeSet::new();
        collect_class_ids(&data, 3, 0.7, &mut ids).unwrap();
        assert!(ids.contains(&2));
    }

    #[test]
    fn test_accumulates_across_outputs() {
        let mut ids = BTreeSet::new();
        collect_class_ids(&row([0.9, 0.0, 0.0]), 3, 0.7, &mut ids).unwrap();
        collect_class_ids(&row([0.9, 0.0, 0.0]), 3, 0.7, &mut ids).unwrap();
        collect_class_ids(&row([0.0, 0.0, 0.9]), 3, 0.7, &mut ids).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_empty_output_yields_no_classes() {
        let mut ids = BTreeSet::new();
        collect_class_ids(&[], 80, 0.7, &mut ids).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_ragged_output_is_an_error() {
        let mut data = row([0.9, 0.0, 0.0]);
        data.push(0.0);
        let mut ids = BTreeSet::new();
        let err = collect_class_ids(&data, 3, 0.7, &mut ids).unwrap_err();
        assert!(matches!(err, PipelineError::Detection { .. }));
    }
}
