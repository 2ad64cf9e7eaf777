// SPDX-License-Identifier: GPL-3.0-only

//! Photo encodings
//!
//! This module handles the still-image encodings the capture core deals in:
//! - JPEG (with quality control), the default photo output
//! - PNG (lossless)
//!
//! Encoding is used by hardware implementations to produce payloads;
//! verification is used by the capture coordinator before delivery.

use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    /// MIME type tag handed to downstream consumers
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            EncodingFormat::Jpeg => ImageFormat::Jpeg,
            EncodingFormat::Png => ImageFormat::Png,
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Dimensions of a payload that decoded successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInfo {
    pub width: u32,
    pub height: u32,
}

/// Encode an RGB image
pub fn encode(image: &RgbImage, format: EncodingFormat, quality: EncodingQuality) -> Result<Vec<u8>, String> {
    match format {
        EncodingFormat::Jpeg => encode_jpeg(image, quality),
        EncodingFormat::Png => encode_png(image),
    }
}

/// Verify that `data` is a complete image in `expected` encoding
///
/// The pixel data is decoded in full so truncated payloads are caught,
/// then dropped; only the dimensions are kept.
pub fn decode(data: &[u8], expected: EncodingFormat) -> Result<DecodedInfo, String> {
    if data.is_empty() {
        return Err("empty payload".to_string());
    }

    let detected =
        image::guess_format(data).map_err(|e| format!("unrecognized image data: {}", e))?;
    if detected != expected.to_image_format() {
        return Err(format!(
            "expected {:?} payload, got {:?}",
            expected, detected
        ));
    }

    let img = image::load_from_memory_with_format(data, detected)
        .map_err(|e| format!("{:?} decoding failed: {}", expected, e))?;

    debug!(
        width = img.width(),
        height = img.height(),
        size = data.len(),
        "Payload decoded"
    );

    Ok(DecodedInfo {
        width: img.width(),
        height: img.height(),
    })
}

/// Encode image as JPEG
fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;

    Ok(buffer)
}

/// Encode image as PNG
fn encode_png(image: &RgbImage) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();

    image
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            ImageFormat::Png,
        )
        .map_err(|e| format!("PNG encoding failed: {}", e))?;

    Ok(buffer)
}
