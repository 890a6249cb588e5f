//! Configuration management for claimcheck.
//!
//! Configuration is loaded from a TOML file with defaults for every key, so an
//! absent file or a partial file both work.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for claimcheck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Text encoder settings
    pub text_encoder: TextEncoderConfig,

    /// Object detector settings
    pub detector: DetectorConfig,

    /// Feature fusion settings
    pub fusion: FusionConfig,

    /// Classifier settings
    pub classifier: ClassifierConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.claimcheck.claimcheck/config.toml
    /// - Linux: ~/.config/claimcheck/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\claimcheck\config\config.toml
    ///
    /// Falls back to ~/.claimcheck/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "claimcheck", "claimcheck")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".claimcheck").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Resolve an artifact to an absolute location.
    ///
    /// Absolute artifact paths are used as-is; relative ones are joined onto
    /// the model directory.
    pub fn artifact_path(&self, artifact: &ArtifactConfig) -> PathBuf {
        let path_str = artifact.path.to_string_lossy();
        let expanded = PathBuf::from(shellexpand::tilde(&path_str).into_owned());
        if expanded.is_absolute() {
            expanded
        } else {
            self.model_dir().join(expanded)
        }
    }

    /// Every artifact the predictor needs, with a short display name.
    pub fn artifacts(&self) -> Vec<(&'static str, &ArtifactConfig)> {
        vec![
            ("text encoder", &self.text_encoder.model),
            ("tokenizer", &self.text_encoder.tokenizer),
            ("detector", &self.detector.model),
            ("class labels", &self.detector.labels),
            ("classifier", &self.classifier.model),
        ]
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
