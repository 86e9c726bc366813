//! Source rasters and mutable pixel surfaces

use crate::io::error::{Result, SynthesisError};
use crate::surface::chunk::Chunk;
use crate::surface::ledger::{SurfaceLease, SurfaceLedger};
use image::{GenericImageView, RgbaImage, imageops};
use std::sync::Arc;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Immutable decoded source raster
///
/// The pipeline only ever reads from a source image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Wrap an RGBA buffer
    ///
    /// # Errors
    ///
    /// Returns a decode error if either dimension is zero
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(crate::io::error::decode_error(&format!(
                "source has an empty axis ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Read-only view of the pixels
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Byte size of a `width` × `height` RGBA buffer
///
/// # Errors
///
/// Returns [`SynthesisError::SizeConstraintExceeded`] if the size does not
/// fit in memory addressing
pub fn buffer_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
        .ok_or(SynthesisError::SizeConstraintExceeded {
            axis: "area",
            requested: f64::from(width) * f64::from(height),
            limit: (usize::MAX / BYTES_PER_PIXEL) as f64,
        })
}

/// Mutable pixel buffer exclusively owned by one synthesis call
///
/// Releasing or dropping the surface returns its bytes to the ledger.
#[derive(Debug)]
pub struct Surface {
    pixels: RgbaImage,
    lease: Option<SurfaceLease>,
}

impl Surface {
    /// Allocate a transparent surface
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::SizeConstraintExceeded`] if the buffer size
    /// overflows
    pub fn new(width: u32, height: u32, ledger: &Arc<SurfaceLedger>) -> Result<Self> {
        let bytes = buffer_len(width, height)?;
        let lease = ledger.acquire(bytes);
        Ok(Self {
            pixels: RgbaImage::new(width, height),
            lease: Some(lease),
        })
    }

    /// Take ownership of existing pixels under a ledger lease
    pub fn from_image(pixels: RgbaImage, ledger: &Arc<SurfaceLedger>) -> Self {
        let lease = ledger.acquire(pixels.as_raw().len());
        Self {
            pixels,
            lease: Some(lease),
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Read-only view of the pixels
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether the buffer has been released
    pub fn is_released(&self) -> bool {
        self.lease.is_none()
    }

    /// Fill `cell` from the top-left corner of `tile`
    ///
    /// The tile is cropped to the cell; nothing outside the cell is written.
    /// A cell larger than the tile keeps its uncovered pixels.
    pub fn blit_cell(&mut self, tile: &Self, cell: Chunk) {
        let width = cell.width.min(tile.width());
        let height = cell.height.min(tile.height());
        let cropped = tile.pixels.view(0, 0, width, height);
        imageops::replace(&mut self.pixels, &*cropped, i64::from(cell.x), i64::from(cell.y));
    }

    /// Copy the pixels of `chunk` into a standalone block
    pub fn read_chunk(&self, chunk: Chunk) -> RgbaImage {
        self.pixels
            .view(chunk.x, chunk.y, chunk.width, chunk.height)
            .to_image()
    }

    /// Write a block produced by [`Self::read_chunk`] back at the chunk origin
    pub fn write_chunk(&mut self, chunk: Chunk, block: &RgbaImage) {
        imageops::replace(
            &mut self.pixels,
            block,
            i64::from(chunk.x),
            i64::from(chunk.y),
        );
    }

    /// Drop the pixel buffer and return its bytes to the ledger
    ///
    /// Dimensions read as zero afterwards.
    pub fn release(&mut self) {
        self.pixels = RgbaImage::new(0, 0);
        self.lease = None;
    }
}
