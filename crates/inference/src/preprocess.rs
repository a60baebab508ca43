//! Deterministic image preprocessing
//!
//! Mirrors the transform the detector was trained with: exact resize to
//! `image_size x image_size`, scale to [0, 1], then per-channel
//! normalization. No randomness; repeated calls on the same bytes produce
//! identical tensors.

use crate::config::DetectorConfig;
use crate::error::DetectorResult;
use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use image::RgbImage;

/// Decodes image bytes into an RGB image
pub fn decode_image(bytes: &[u8]) -> DetectorResult<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Transforms an RGB image into a normalized CHW tensor
pub fn preprocess(
    image: &RgbImage,
    config: &DetectorConfig,
    device: &Device,
) -> DetectorResult<Tensor> {
    let size = config.image_size as u32;
    let resized = if image.dimensions() == (size, size) {
        image.clone()
    } else {
        image::imageops::resize(image, size, size, FilterType::Triangle)
    };

    let hw = (size as usize) * (size as usize);
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (f32::from(pixel.0[c]) / 255.0 - config.mean[c]) / config.std[c];
        }
    }

    let tensor = Tensor::from_vec(data, (3, size as usize, size as usize), device)?;
    Ok(tensor)
}
