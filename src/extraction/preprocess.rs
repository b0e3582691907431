//! Image preparation before upload to the model.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;
use std::path::Path;

/// A self-contained, base64-encoded image ready to embed in a request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    /// Base64 (standard alphabet) of the encoded bytes
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// Loads an image from disk and encodes it for upload.
pub fn prepare_image(path: &Path, max_dimension: u32) -> Result<EncodedImage> {
    let img = image::open(path).context(format!("Failed to load image: {}", path.display()))?;
    encode_image(&img, max_dimension)
}

/// Downscales so neither side exceeds `max_dimension` (aspect ratio kept),
/// then encodes as PNG.
pub fn encode_image(img: &DynamicImage, max_dimension: u32) -> Result<EncodedImage> {
    let scaled = if max_dimension > 0 && (img.width() > max_dimension || img.height() > max_dimension) {
        img.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        img.clone()
    };

    let mut bytes = Cursor::new(Vec::new());
    scaled
        .write_to(&mut bytes, ImageFormat::Png)
        .context("Failed to encode image as PNG")?;

    Ok(EncodedImage {
        mime_type: "image/png",
        data: STANDARD.encode(bytes.into_inner()),
        width: scaled.width(),
        height: scaled.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(width, height, Rgba([200, 200, 200, 255])))
    }

    #[test]
    fn test_small_image_kept_as_is() {
        let encoded = encode_image(&solid(100, 50), 1600).unwrap();
        assert_eq!((encoded.width, encoded.height), (100, 50));
        assert_eq!(encoded.mime_type, "image/png");
    }

    #[test]
    fn test_large_image_downscaled_keeping_aspect() {
        let encoded = encode_image(&solid(3200, 1600), 1600).unwrap();
        assert_eq!((encoded.width, encoded.height), (1600, 800));
    }

    #[test]
    fn test_output_is_decodable_png() {
        let encoded = encode_image(&solid(8, 8), 0).unwrap();
        let bytes = STANDARD.decode(&encoded.data).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 8);
    }
}
