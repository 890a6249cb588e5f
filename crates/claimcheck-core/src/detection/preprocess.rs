//! Image preprocessing for the object detector.
//!
//! The detector expects:
//! - Input size: 320×320 pixels (configurable), stretched without cropping
//! - Normalization: pixel / 255, so values lie in [0, 1]
//! - Channel order: RGB
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// Pixel scale factor.
const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// Preprocess an image for detector inference.
///
/// Resizes to `input_size × input_size` with a bilinear filter, converts to
/// RGB, scales to [0, 1], and returns an NCHW tensor for ONNX Runtime.
pub fn preprocess(image: &DynamicImage, input_size: u32) -> Array4<f32> {
    let resized = image.resize_exact(
        input_size,
        input_size,
        image::imageops::FilterType::Triangle,
    );
    let rgb = resized.to_rgb8();

    let size = input_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        let y = i / size;
        let x = i % size;
        for (c, &val) in pixel.iter().enumerate() {
            tensor[[0, c, y, x]] = val as f32 * PIXEL_SCALE;
        }
    }

    tensor
}
