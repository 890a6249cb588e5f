//! Image decoding from uploaded bytes with format sniffing and size limits.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an image from an in-memory byte buffer.
    ///
    /// The format is detected from content, not from any client-supplied
    /// filename or content type.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
        if bytes.len() > self.limits.max_upload_bytes() {
            return Err(PipelineError::PayloadTooLarge {
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_upload_mb,
            });
        }

        // Read the header once for dimensions before allocating the full image.
        let (width, height) = Self::reader(bytes)?
            .into_dimensions()
            .map_err(|e| PipelineError::Decode {
                message: e.to_string(),
            })?;
        self.check_dimensions(width, height)?;

        let reader = Self::reader(bytes)?;
        let format = reader.format().ok_or_else(|| PipelineError::Decode {
            message: "Unrecognized image format".to_string(),
        })?;
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            message: e.to_string(),
        })?;
        let (width, height) = image.dimensions();

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }

    fn reader(bytes: &[u8]) -> Result<image::ImageReader<Cursor<&[u8]>>, PipelineError> {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                message: format!("Cannot detect image format: {}", e),
            })
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), PipelineError> {
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Ico => "ico".to_string(),
        ImageFormat::Pnm => "pnm".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}
