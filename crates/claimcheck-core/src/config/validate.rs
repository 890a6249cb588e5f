//! Configuration validation with range checks.

use std::net::SocketAddr;

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "server.listen_addr is not a socket address: {:?}",
                self.server.listen_addr
            )));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.text_encoder.max_length < 2 {
            return Err(ConfigError::ValidationError(
                "text_encoder.max_length must be >= 2".into(),
            ));
        }
        if self.detector.input_size == 0 {
            return Err(ConfigError::ValidationError(
                "detector.input_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(ConfigError::ValidationError(
                "detector.confidence_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.fusion.feature_width == 0 {
            return Err(ConfigError::ValidationError(
                "fusion.feature_width must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
