//! Error types for the claimcheck inference pipeline.
//!
//! Errors are organized by stage so a failure message names where it happened
//! (decode, text encoding, detection, fusion, classification) and, for model
//! loading, which file on disk was involved.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for claimcheck operations.
#[derive(Error, Debug)]
pub enum ClaimcheckError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image bytes could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Uploaded payload exceeds the size limit
    #[error("Image payload too large ({size_mb}MB > {max_mb}MB)")]
    PayloadTooLarge { size_mb: u64, max_mb: u64 },

    /// Image dimensions exceed the limit
    #[error("Image too large ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// A model artifact is missing or failed to load
    #[error("Model error for {path}: {message}")]
    Model { path: PathBuf, message: String },

    /// Text encoder tokenization or inference failed
    #[error("Text encoding failed: {message}")]
    TextEncoding { message: String },

    /// Object detector inference or output parsing failed
    #[error("Object detection failed: {message}")]
    Detection { message: String },

    /// Class-label table problems (empty file, unknown class id)
    #[error("Label table error: {message}")]
    Labels { message: String },

    /// Embedding sequences could not be fused
    #[error("Feature fusion failed: {message}")]
    Fusion { message: String },

    /// Classifier inference failed or produced an unusable output
    #[error("Classification failed: {message}")]
    Classification { message: String },

    /// The blocking inference task panicked or was cancelled
    #[error("Inference task failed: {message}")]
    Task { message: String },
}

/// Convenience type alias for claimcheck results.
pub type Result<T> = std::result::Result<T, ClaimcheckError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
