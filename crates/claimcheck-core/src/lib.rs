//! claimcheck core - claim/image fusion and real/fake classification.
//!
//! A claim and an image go through two pretrained models, a transformer text
//! encoder and an object detector, whose outputs are fused into a fixed-width
//! vector for a trained classifier.
//!
//! # Architecture
//!
//! ```text
//! Image → Decode → Detect (YOLO) → label string ─┐
//!                                                ├→ Encode (BERT) ×2 → Fuse → Classify → real/fake
//! Claim ─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use claimcheck_core::{Config, Predictor};
//!
//! let config = Config::load()?;
//! let predictor = Predictor::load(&config)?;
//!
//! let image = std::fs::read("./photo.jpg")?;
//! let prediction = predictor.predict("breaking news", &image)?;
//! println!("{} {:?}", prediction.label, prediction.softmax);
//! ```

// Module declarations
pub mod checksum;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod encoder;
pub mod error;
pub mod fusion;
pub mod math;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use classifier::{Classifier, OnnxClassifier};
pub use config::Config;
pub use detection::{LabelTable, ObjectDetector, YoloDetector};
pub use encoder::{BertEncoder, TextEncoder};
pub use error::{ClaimcheckError, ConfigError, PipelineError, PipelineResult, Result};
pub use fusion::{FeatureFuser, FEATURE_WIDTH};
pub use pipeline::Predictor;
pub use types::{Analysis, Prediction, Verdict};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_fusion_width_matches_classifier_input() {
        assert_eq!(Config::default().fusion.feature_width, FEATURE_WIDTH);
        assert_eq!(FeatureFuser::default().width(), 23040);
    }
}
