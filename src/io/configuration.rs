//! Synthesis constants and runtime configuration defaults

use crate::io::error::{Result, invalid_parameter};
use crate::io::image::OutputFormat;
use image::imageops::FilterType;

// Surface limits
/// Maximum texture dimension before the per-axis `sqrt(scale)` divisor
pub const MAX_TEXTURE_SIZE: u32 = 4096;
/// Largest source image accepted for decoding, in pixels
pub const MAX_SOURCE_PIXELS: u64 = 40_000_000;
/// Largest destination surface, in pixels (16384 × 16384, 1 GiB of RGBA)
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

// Incremental work units
/// Grid cells blitted per compositor chunk
pub const CELLS_PER_CHUNK: u32 = 1;
/// Edge length of square noise chunks in pixels
pub const NOISE_CHUNK_SIZE: u32 = 256;
/// Pixels sharing one random draw along the linear chunk buffer
pub const NOISE_STRIDE: usize = 4;
/// Peak noise perturbation on the 0-255 channel scale
pub const NOISE_AMOUNT: f32 = 8.0;

// Encoding
/// JPEG quality used for dry-run output
pub const DRY_RUN_JPEG_QUALITY: u8 = 80;

// Batching
/// Items submitted together per batch group
pub const DEFAULT_BATCH_SIZE: usize = 4;
/// Upper bound on offload worker threads
pub const MAX_WORKERS: usize = 64;
/// Pending requests buffered per offload worker
pub const OFFLOAD_QUEUE_CAPACITY: usize = 16;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_tiled";
/// Width of the batch progress bar in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Tunables carried explicitly into the synthesis pipeline
#[derive(Clone, Copy, Debug)]
pub struct SynthesisConfig {
    /// Maximum texture dimension used by the size calculator
    pub max_texture_size: u32,
    /// Raise an error instead of clamping oversized tiles
    pub strict_size: bool,
    /// Grid cells blitted per compositor chunk
    pub cells_per_chunk: u32,
    /// Edge length of square noise chunks
    pub noise_chunk_size: u32,
    /// Pixels sharing one random draw
    pub noise_stride: usize,
    /// Peak noise perturbation on the 0-255 scale
    pub noise_amount: f32,
    /// Fixed noise seed, drawn from the OS when absent
    pub noise_seed: Option<u64>,
    /// Filter used for the single tile resample
    pub resize_filter: FilterType,
    /// Encoding used for full-quality output
    pub output_format: OutputFormat,
    /// Encoding used for dry-run output
    pub dry_run_format: OutputFormat,
    /// Largest decodable source in pixels
    pub max_source_pixels: u64,
    /// Largest destination surface in pixels, checked before allocating
    pub max_surface_pixels: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_texture_size: MAX_TEXTURE_SIZE,
            strict_size: false,
            cells_per_chunk: CELLS_PER_CHUNK,
            noise_chunk_size: NOISE_CHUNK_SIZE,
            noise_stride: NOISE_STRIDE,
            noise_amount: NOISE_AMOUNT,
            noise_seed: None,
            resize_filter: FilterType::Triangle,
            output_format: OutputFormat::Png,
            dry_run_format: OutputFormat::Jpeg {
                quality: DRY_RUN_JPEG_QUALITY,
            },
            max_source_pixels: MAX_SOURCE_PIXELS,
            max_surface_pixels: MAX_SURFACE_PIXELS,
        }
    }
}

impl SynthesisConfig {
    /// Check every tunable against its valid range
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for zero sizes, a zero stride,
    /// a negative or non-finite noise amount, or a JPEG quality outside 1..=100
    pub fn validate(&self) -> Result<()> {
        if self.max_texture_size == 0 {
            return Err(invalid_parameter(
                "max_texture_size",
                &self.max_texture_size,
                &"must be at least 1",
            ));
        }
        if self.cells_per_chunk == 0 {
            return Err(invalid_parameter(
                "cells_per_chunk",
                &self.cells_per_chunk,
                &"must be at least 1",
            ));
        }
        if self.noise_chunk_size == 0 {
            return Err(invalid_parameter(
                "noise_chunk_size",
                &self.noise_chunk_size,
                &"must be at least 1",
            ));
        }
        if self.noise_stride == 0 {
            return Err(invalid_parameter(
                "noise_stride",
                &self.noise_stride,
                &"must be at least 1",
            ));
        }
        if !self.noise_amount.is_finite() || self.noise_amount < 0.0 {
            return Err(invalid_parameter(
                "noise_amount",
                &self.noise_amount,
                &"must be a finite, non-negative number",
            ));
        }
        if self.max_source_pixels == 0 {
            return Err(invalid_parameter(
                "max_source_pixels",
                &self.max_source_pixels,
                &"must be at least 1",
            ));
        }
        if self.max_surface_pixels == 0 {
            return Err(invalid_parameter(
                "max_surface_pixels",
                &self.max_surface_pixels,
                &"must be at least 1",
            ));
        }
        self.output_format.validate("output_format")?;
        self.dry_run_format.validate("dry_run_format")
    }

    /// Output encoding for a request
    pub const fn format_for(&self, dry_run: bool) -> OutputFormat {
        if dry_run {
            self.dry_run_format
        } else {
            self.output_format
        }
    }
}

/// What the orchestrator does when an item fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep processing later groups
    #[default]
    Continue,
    /// Stop after the group containing the first failure
    Abort,
}

/// Batch orchestration tunables
#[derive(Clone, Copy, Debug)]
pub struct BatchConfig {
    /// Maximum items in flight per group
    pub batch_size: usize,
    /// Reaction to per-item failures
    pub failure_policy: FailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            failure_policy: FailurePolicy::Continue,
        }
    }
}

impl BatchConfig {
    /// Check the batch size
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the batch size is zero
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(invalid_parameter(
                "batch_size",
                &self.batch_size,
                &"must be at least 1",
            ));
        }
        Ok(())
    }
}
