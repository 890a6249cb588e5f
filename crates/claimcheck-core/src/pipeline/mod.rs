//! Request pipeline components.
//!
//! - **decode**: Decode uploaded image bytes with size and dimension limits
//! - **predictor**: Orchestrates detection, encoding, fusion and classification

pub mod decode;
pub mod predictor;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use predictor::Predictor;
