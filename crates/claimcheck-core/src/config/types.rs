//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where model artifacts are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.claimcheck/models"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the server binds to
    pub listen_addr: String,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            cors_origins: vec![],
        }
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes (whole request body and image payload)
    pub max_upload_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 20,
            max_image_dimension: 10000,
        }
    }
}

impl LimitsConfig {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// A downloadable model artifact: local path (relative to `model_dir`),
/// optional source URL and optional BLAKE3 checksum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Path relative to the model directory
    pub path: PathBuf,

    /// Where `claimcheck models download` fetches the file from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Expected BLAKE3 hex digest, verified after download
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blake3: Option<String>,
}

impl ArtifactConfig {
    fn local(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            url: None,
            blake3: None,
        }
    }

    fn remote(path: &str, url: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            url: Some(url.to_string()),
            blake3: None,
        }
    }
}

/// Transformer text encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextEncoderConfig {
    /// Token sequences are truncated to this length (BERT position limit)
    pub max_length: usize,

    /// ONNX graph producing `last_hidden_state`
    pub model: ArtifactConfig,

    /// HuggingFace `tokenizer.json`
    pub tokenizer: ArtifactConfig,
}

impl Default for TextEncoderConfig {
    fn default() -> Self {
        Self {
            max_length: 512,
            model: ArtifactConfig::remote(
                "bert-base-uncased/model.onnx",
                "https://huggingface.co/Xenova/bert-base-uncased/resolve/main/onnx/model.onnx",
            ),
            tokenizer: ArtifactConfig::remote(
                "bert-base-uncased/tokenizer.json",
                "https://huggingface.co/Xenova/bert-base-uncased/resolve/main/tokenizer.json",
            ),
        }
    }
}

/// Object detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Square input resolution in pixels
    pub input_size: u32,

    /// A class is kept only when its score is strictly above this
    pub confidence_threshold: f32,

    /// YOLOv3-style ONNX graph
    pub model: ArtifactConfig,

    /// Newline-delimited class labels, line index = class id
    pub labels: ArtifactConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: 320,
            confidence_threshold: 0.7,
            model: ArtifactConfig::local("yolov3/model.onnx"),
            labels: ArtifactConfig::remote(
                "yolov3/coco.names",
                "https://raw.githubusercontent.com/pjreddie/darknet/master/data/coco.names",
            ),
        }
    }
}

/// Feature fusion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Width of the fused vector the classifier was trained on
    pub feature_width: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            feature_width: crate::fusion::FEATURE_WIDTH,
        }
    }
}

/// Classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// ONNX graph mapping `1 x feature_width` to `[score_fake, score_real]`
    pub model: ArtifactConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: ArtifactConfig::local("classifier/model.onnx"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
