//! Object detection over the uploaded image.
//!
//! The detector only contributes *which* object classes appear: box
//! coordinates and objectness are discarded, class ids above the confidence
//! threshold are collected into a set, and the set is turned into a label
//! string through [`LabelTable`].

mod labels;
mod preprocess;
mod yolo;

use std::collections::BTreeSet;

use image::DynamicImage;

use crate::error::PipelineError;

pub use labels::LabelTable;
pub use preprocess::preprocess as preprocess_for_detector;
pub use yolo::{collect_class_ids, YoloDetector};

/// Maps an image to the set of confidently detected class ids.
pub trait ObjectDetector: Send + Sync {
    /// Run one detector pass over `image`.
    fn detect(&self, image: &DynamicImage) -> Result<BTreeSet<usize>, PipelineError>;
}
