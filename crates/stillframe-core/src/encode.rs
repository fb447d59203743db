//! Raster image encoding
//!
//! Turns a read-back `ImageFrame` into an `ImagePayload` using the `image`
//! crate codecs.

use crate::output::{ImageFormat, ImageFrame, ImagePayload};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Encoding errors
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Pixel buffer of {actual} bytes does not match {width}x{height} RGBA8")]
    BufferMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error("Codec failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Output format
    pub format: ImageFormat,
    /// JPEG quality (1 - 100), ignored for PNG
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            jpeg_quality: 90,
        }
    }
}

impl EncodeOptions {
    pub fn png() -> Self {
        Self::default()
    }

    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: ImageFormat::Jpeg,
            jpeg_quality: quality.clamp(1, 100),
        }
    }
}

/// Encode a frame into a self-describing payload
pub fn encode(frame: &ImageFrame, options: &EncodeOptions) -> Result<ImagePayload, EncodeError> {
    let mismatch = || EncodeError::BufferMismatch {
        width: frame.width,
        height: frame.height,
        actual: frame.data.len(),
    };

    if frame.width == 0 || frame.height == 0 {
        return Err(mismatch());
    }

    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(mismatch)?;

    let mut bytes = Vec::new();
    match options.format {
        ImageFormat::Png => {
            rgba.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        }
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut bytes,
                options.jpeg_quality.clamp(1, 100),
            );
            rgb.write_with_encoder(encoder)?;
        }
    }

    tracing::debug!(
        format = ?options.format,
        width = frame.width,
        height = frame.height,
        bytes = bytes.len(),
        "Encoded frame"
    );

    Ok(ImagePayload::new(
        options.format,
        frame.width,
        frame.height,
        bytes,
    ))
}
