//! Prediction service - wires decode, detection, encoding, fusion and
//! classification together.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use ndarray::Array2;

use crate::classifier::{Classifier, OnnxClassifier};
use crate::config::Config;
use crate::detection::{LabelTable, ObjectDetector, YoloDetector};
use crate::encoder::{BertEncoder, TextEncoder};
use crate::error::{PipelineError, PipelineResult};
use crate::fusion::FeatureFuser;
use crate::types::{Analysis, Prediction};

use super::decode::{format_to_string, ImageDecoder};

/// Fused features plus the intermediate values behind them.
struct FusedInput {
    features: Array2<f32>,
    detected_objects: String,
    claim_tokens: usize,
    object_tokens: usize,
}

/// Holds the loaded models and runs the full claim/image pipeline.
///
/// Built once at startup and shared read-only between requests.
pub struct Predictor {
    text_encoder: Arc<dyn TextEncoder>,
    detector: Arc<dyn ObjectDetector>,
    classifier: Arc<dyn Classifier>,
    labels: LabelTable,
    decoder: ImageDecoder,
    fuser: FeatureFuser,
}

impl Predictor {
    /// Assemble a predictor from already-loaded models.
    pub fn new(
        text_encoder: Arc<dyn TextEncoder>,
        detector: Arc<dyn ObjectDetector>,
        classifier: Arc<dyn Classifier>,
        labels: LabelTable,
        config: &Config,
    ) -> Self {
        Self {
            text_encoder,
            detector,
            classifier,
            labels,
            decoder: ImageDecoder::new(config.limits.clone()),
            fuser: FeatureFuser::new(config.fusion.feature_width),
        }
    }

    /// Load every model artifact named in the configuration.
    pub fn load(config: &Config) -> PipelineResult<Self> {
        let start = Instant::now();

        let labels = LabelTable::load(&config.artifact_path(&config.detector.labels))?;

        tracing::info!("Loading text encoder...");
        let text_encoder = BertEncoder::load(
            &config.artifact_path(&config.text_encoder.model),
            &config.artifact_path(&config.text_encoder.tokenizer),
            config.text_encoder.max_length,
        )?;

        tracing::info!("Loading object detector ({} classes)...", labels.len());
        let detector = YoloDetector::load(
            &config.artifact_path(&config.detector.model),
            config.detector.input_size,
            labels.len(),
            config.detector.confidence_threshold,
        )?;

        tracing::info!("Loading classifier...");
        let classifier = OnnxClassifier::load(&config.artifact_path(&config.classifier.model))?;

        tracing::info!("Models loaded in {:?}", start.elapsed());

        Ok(Self::new(
            Arc::new(text_encoder),
            Arc::new(detector),
            Arc::new(classifier),
            labels,
            config,
        ))
    }

    /// Width of the fused feature vectors.
    pub fn feature_width(&self) -> usize {
        self.fuser.width()
    }

    /// Run the detector and return the space-joined, sorted label string.
    pub fn detect_objects(&self, image: &DynamicImage) -> PipelineResult<String> {
        let class_ids = self.detector.detect(image)?;
        self.labels.join(&class_ids)
    }

    /// Produce the `1 × feature_width` classifier input for a claim and image.
    pub fn features(&self, text: &str, image_bytes: &[u8]) -> PipelineResult<Array2<f32>> {
        Ok(self.fuse_input(text, image_bytes)?.features)
    }

    /// Classify a claim/image pair.
    pub fn predict(&self, text: &str, image_bytes: &[u8]) -> PipelineResult<Prediction> {
        Ok(self.analyze(text, image_bytes)?.prediction)
    }

    /// Classify a claim/image pair and keep the intermediate values.
    pub fn analyze(&self, text: &str, image_bytes: &[u8]) -> PipelineResult<Analysis> {
        let input = self.fuse_input(text, image_bytes)?;

        let classify_start = Instant::now();
        let scores = self.classifier.classify(&input.features)?;
        tracing::trace!("  Classify: {:?}", classify_start.elapsed());

        let prediction = Prediction::from_scores(scores);
        tracing::debug!(
            "Prediction {} (fake={:.4}, real={:.4}) objects={:?}",
            prediction.label,
            scores[0],
            scores[1],
            input.detected_objects
        );

        Ok(Analysis {
            prediction,
            detected_objects: input.detected_objects,
            claim_tokens: input.claim_tokens,
            object_tokens: input.object_tokens,
        })
    }

    /// Classify on the blocking thread pool so async callers aren't stalled
    /// by inference.
    pub async fn predict_blocking(
        self: Arc<Self>,
        text: String,
        image_bytes: Vec<u8>,
    ) -> PipelineResult<Analysis> {
        tokio::task::spawn_blocking(move || self.analyze(&text, &image_bytes))
            .await
            .map_err(|e| PipelineError::Task {
                message: e.to_string(),
            })?
    }

    fn fuse_input(&self, text: &str, image_bytes: &[u8]) -> PipelineResult<FusedInput> {
        let start = Instant::now();

        let encode_start = Instant::now();
        let claim_hidden = self.text_encoder.encode(text)?;
        tracing::trace!("  Encode claim: {:?}", encode_start.elapsed());

        let decode_start = Instant::now();
        let decoded = self.decoder.decode(image_bytes)?;
        tracing::trace!(
            "  Decode: {:?} ({} {}x{})",
            decode_start.elapsed(),
            format_to_string(decoded.format),
            decoded.width,
            decoded.height
        );

        let detect_start = Instant::now();
        let detected_objects = self.detect_objects(&decoded.image)?;
        tracing::trace!("  Detect: {:?}", detect_start.elapsed());

        let encode_start = Instant::now();
        let object_hidden = self.text_encoder.encode(&detected_objects)?;
        tracing::trace!("  Encode objects: {:?}", encode_start.elapsed());

        let fuse_start = Instant::now();
        let features = self.fuser.fuse(&claim_hidden, &object_hidden)?;
        tracing::trace!("  Fuse: {:?}", fuse_start.elapsed());

        tracing::debug!(
            "Built {} features from {} claim tokens and {} object tokens in {:?}",
            features.len(),
            claim_hidden.nrows(),
            object_hidden.nrows(),
            start.elapsed()
        );

        Ok(FusedInput {
            features,
            detected_objects,
            claim_tokens: claim_hidden.nrows(),
            object_tokens: object_hidden.nrows(),
        })
    }
}
