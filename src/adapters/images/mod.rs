//! Image resolution for answers that carry an illustration
//!
//! Resolvers turn an image URL into an [`EmbeddedImage`]: decoded once,
//! re-encoded as PNG, with its pixel dimensions. Every failure (bad URL,
//! network error, non-success status, timeout, undecodable body) becomes
//! `None` so a broken image never aborts an export.

pub mod resolver;

pub use resolver::HttpAssetResolver;

use crate::domain::{KeepsakeError, Result};
use async_trait::async_trait;
use image::ImageFormat;
use std::io::Cursor;

/// An image ready to be placed in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// PNG-encoded pixels
    pub png: Vec<u8>,

    /// Width in pixels
    pub width_px: u32,

    /// Height in pixels
    pub height_px: u32,
}

impl EmbeddedImage {
    /// Decodes any supported raster format and re-encodes it as PNG
    ///
    /// # Errors
    ///
    /// Returns a validation error when the bytes are not a decodable image or
    /// the image has no pixels.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| KeepsakeError::Validation(format!("Undecodable image: {e}")))?;

        let (width_px, height_px) = (img.width(), img.height());
        if width_px == 0 || height_px == 0 {
            return Err(KeepsakeError::Validation("Image has no pixels".to_string()));
        }

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| KeepsakeError::Validation(format!("PNG re-encoding failed: {e}")))?;

        Ok(Self {
            png,
            width_px,
            height_px,
        })
    }

    /// Height matching `width` with the original aspect ratio
    pub fn height_for_width(&self, width: f64) -> f64 {
        width * f64::from(self.height_px) / f64::from(self.width_px)
    }
}

/// Fetches images referenced by answers
///
/// Implementations must never fail: any problem is reported as `None`.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolves `url` into an embeddable image
    async fn resolve(&self, url: &str) -> Option<EmbeddedImage>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Encodes a solid image of the given size
    pub fn sample_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::sample_image;
    use super::*;

    #[test]
    fn test_decode_png() {
        let image = EmbeddedImage::decode(&sample_image(40, 20, ImageFormat::Png)).unwrap();
        assert_eq!((image.width_px, image.height_px), (40, 20));
        assert_eq!(image.height_for_width(90.0), 45.0);
    }

    #[test]
    fn test_decode_jpeg_reencodes_png() {
        let image = EmbeddedImage::decode(&sample_image(8, 8, ImageFormat::Jpeg)).unwrap();
        assert_eq!(
            image::guess_format(&image.png).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_decode_garbage() {
        let err = EmbeddedImage::decode(b"<html>not an image</html>").unwrap_err();
        assert!(matches!(err, KeepsakeError::Validation(_)));
    }
}
