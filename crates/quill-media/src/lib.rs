//! Cover image normalization: decode, downscale to fit fixed caps, and
//! re-encode into a self-contained data URL for embedding in a post.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};
use thiserror::Error;
use tracing::warn;

pub const MAX_WIDTH: u32 = 1280;
pub const MAX_HEIGHT: u32 = 1280;
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to decode image data")]
    Decode(#[source] image::ImageError),
    #[error("image normalization task did not complete")]
    Cancelled,
}

/// A normalized image payload plus the pixel size it ended up with, so
/// callers can pick cover layout without decoding the data URL again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
            max_height: MAX_HEIGHT,
            quality: JPEG_QUALITY,
        }
    }
}

impl ImageNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caps(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Decode, fit within the caps without ever upscaling, and re-encode
    /// as JPEG. An undecodable input fails with [`MediaError::Decode`];
    /// an encode failure falls back to the original bytes wrapped as a
    /// data URL of their sniffed format.
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<NormalizedImage, MediaError> {
        let decoded = image::load_from_memory(bytes).map_err(MediaError::Decode)?;
        let (width, height) = (decoded.width(), decoded.height());

        let ratio = (self.max_width as f64 / width as f64)
            .min(self.max_height as f64 / height as f64)
            .min(1.0);
        let scaled = if ratio < 1.0 {
            let target_width = ((width as f64 * ratio).round() as u32).max(1);
            let target_height = ((height as f64 * ratio).round() as u32).max(1);
            decoded.resize_exact(target_width, target_height, FilterType::Lanczos3)
        } else {
            decoded
        };

        match encode_jpeg(&scaled, self.quality) {
            Ok(encoded) => Ok(NormalizedImage {
                data_url: to_data_url("image/jpeg", &encoded),
                width: scaled.width(),
                height: scaled.height(),
            }),
            Err(error) => {
                warn!(%error, "jpeg encode failed, keeping original image bytes");
                Ok(NormalizedImage {
                    data_url: to_data_url(sniff_mime(bytes), bytes),
                    width,
                    height,
                })
            }
        }
    }

    /// Async wrapper: the decode/resize/encode work is CPU-bound, so it
    /// runs on the blocking pool while the caller awaits the one in-flight
    /// normalization.
    pub async fn normalize(&self, bytes: Vec<u8>) -> Result<NormalizedImage, MediaError> {
        let normalizer = *self;
        tokio::task::spawn_blocking(move || normalizer.normalize_bytes(&bytes))
            .await
            .map_err(|_| MediaError::Cancelled)?
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut output = Vec::new();
    rgb.write_to(
        &mut Cursor::new(&mut output),
        ImageOutputFormat::Jpeg(quality),
    )?;
    Ok(output)
}

fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Gif) => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .expect("encode test png");
        bytes
    }

    #[test]
    fn downscales_oversized_images_uniformly() {
        let normalized = ImageNormalizer::new()
            .normalize_bytes(&png_bytes(2000, 1000))
            .expect("normalize");
        assert_eq!(normalized.width, 1280);
        assert_eq!(normalized.height, 640);
        assert!(normalized.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn never_upscales_small_images() {
        let normalized = ImageNormalizer::new()
            .normalize_bytes(&png_bytes(100, 50))
            .expect("normalize");
        assert_eq!(normalized.width, 100);
        assert_eq!(normalized.height, 50);
    }

    #[test]
    fn caps_hold_for_portrait_input() {
        let normalized = ImageNormalizer::new()
            .normalize_bytes(&png_bytes(1000, 4000))
            .expect("normalize");
        assert!(normalized.width <= MAX_WIDTH);
        assert!(normalized.height <= MAX_HEIGHT);
        assert_eq!(normalized.height, 1280);
        assert_eq!(normalized.width, 320);
        assert!(normalized.is_portrait());
    }

    #[test]
    fn undecodable_input_is_a_decode_error() {
        let result = ImageNormalizer::new().normalize_bytes(b"not an image at all");
        assert!(matches!(result, Err(MediaError::Decode(_))));
    }

    #[test]
    fn custom_caps_apply() {
        let normalized = ImageNormalizer::new()
            .with_caps(64, 64)
            .normalize_bytes(&png_bytes(128, 128))
            .expect("normalize");
        assert_eq!(normalized.width, 64);
        assert_eq!(normalized.height, 64);
    }

    #[tokio::test]
    async fn async_wrapper_matches_sync_result() {
        let bytes = png_bytes(2000, 1000);
        let normalizer = ImageNormalizer::new();
        let from_async = normalizer.normalize(bytes.clone()).await.expect("async");
        let from_sync = normalizer.normalize_bytes(&bytes).expect("sync");
        assert_eq!(from_async, from_sync);
    }
}
