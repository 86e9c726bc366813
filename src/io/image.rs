//! Decoding source bytes and encoding finished surfaces

use crate::io::error::{Result, SynthesisError, decode_error, invalid_parameter};
use crate::surface::buffer::{SourceImage, Surface};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Encoding applied to a finished surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG with alpha
    Png,
    /// Lossy JPEG without alpha
    Jpeg {
        /// Encoder quality in 1..=100
        quality: u8,
    },
}

impl OutputFormat {
    /// Short format name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpeg",
        }
    }

    /// Conventional file extension
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }

    /// MIME type of the encoded bytes
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    pub(crate) fn validate(self, parameter: &'static str) -> Result<()> {
        match self {
            Self::Jpeg { quality } if !(1..=100).contains(&quality) => Err(invalid_parameter(
                parameter,
                &quality,
                &"JPEG quality must be within 1..=100",
            )),
            _ => Ok(()),
        }
    }
}

/// Encoded output image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Encoded file bytes
    #[serde(with = "crate::offload::protocol::base64_bytes")]
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`
    pub format: OutputFormat,
    /// Width of the encoded raster
    pub width: u32,
    /// Height of the encoded raster
    pub height: u32,
}

/// Decode raw image bytes into a source raster
///
/// The header is inspected first so oversized inputs are rejected before
/// a full decode allocates their pixel buffer.
///
/// # Errors
///
/// Returns [`SynthesisError::Decode`] if the format is unknown, the data is
/// corrupt, an axis is empty, or the pixel count exceeds `max_pixels`
pub fn decode_source(bytes: &[u8], max_pixels: u64) -> Result<SourceImage> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(&format!("unreadable header: {e}")))?
        .into_dimensions()
        .map_err(|e| SynthesisError::Decode {
            reason: "unrecognized image data".to_string(),
            source: Some(e),
        })?;

    let pixels = u64::from(width) * u64::from(height);
    if pixels > max_pixels {
        return Err(decode_error(&format!(
            "source of {width}x{height} ({pixels} pixels) exceeds the limit of {max_pixels} pixels"
        )));
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| SynthesisError::Decode {
        reason: "corrupt image data".to_string(),
        source: Some(e),
    })?;

    SourceImage::from_rgba(decoded.to_rgba8())
}

/// Serialize a surface in the requested format
///
/// # Errors
///
/// Returns [`SynthesisError::Encode`] if the encoder rejects the surface,
/// for example an empty or oversized one
pub fn encode_surface(surface: &Surface, format: OutputFormat) -> Result<EncodedImage> {
    let pixels = surface.pixels();
    let (width, height) = pixels.dimensions();
    let mut bytes = Vec::new();

    let written = match format {
        OutputFormat::Png => PngEncoder::new(&mut bytes).write_image(
            pixels.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        OutputFormat::Jpeg { quality } => {
            let rgb: RgbImage = pixels.convert();
            JpegEncoder::new_with_quality(&mut bytes, quality).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
    };

    written.map_err(|e| SynthesisError::Encode {
        format: format.name(),
        source: e,
    })?;

    Ok(EncodedImage {
        bytes,
        format,
        width,
        height,
    })
}
