//! Shot thumbnails.
//!
//! Each shot keeps a small JPEG of its most saturated sampled frame. The
//! thumbnail is encoded from the same downscaled raster the features were
//! computed from, so no extra decode is needed.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, RgbaImage, codecs::jpeg::JpegEncoder};

use crate::error::AnalysisError;

/// JPEG quality used for shot thumbnails.
pub const THUMBNAIL_QUALITY: u8 = 50;

/// A JPEG-encoded frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// Baseline JPEG bytes.
    pub jpeg: Vec<u8>,
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg_bytes", &self.jpeg.len())
            .finish()
    }
}

impl Thumbnail {
    /// Encode a tightly packed RGBA raster. Alpha is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidFrameBuffer`] if `rgba` is shorter than
    /// `width × height × 4`, or [`AnalysisError::ImageError`] if encoding fails.
    pub fn from_rgba(rgba: &[u8], width: u32, height: u32) -> Result<Self, AnalysisError> {
        let expected = width as usize * height as usize * 4;
        let raster = rgba
            .get(..expected)
            .and_then(|pixels| RgbaImage::from_raw(width, height, pixels.to_vec()))
            .ok_or(AnalysisError::InvalidFrameBuffer {
                expected,
                actual: rgba.len(),
            })?;
        let rgb = DynamicImage::ImageRgba8(raster).to_rgb8();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, THUMBNAIL_QUALITY).encode_image(&rgb)?;

        Ok(Self {
            width,
            height,
            jpeg,
        })
    }

    /// `data:image/jpeg;base64,...` form for embedding in HTML or JSON.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.jpeg))
    }
}
