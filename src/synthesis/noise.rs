//! Low-frequency channel noise applied chunk by chunk
//!
//! One uniform draw is shared by a window of `stride` consecutive pixels in
//! the chunk's linear buffer, which gives smoother noise than per-pixel
//! draws at a quarter of the random-number cost.

use crate::io::configuration::SynthesisConfig;
use crate::io::error::Result;
use crate::surface::buffer::{BYTES_PER_PIXEL, Surface};
use crate::surface::chunk::{Chunk, square_chunks};
use crate::synthesis::checkpoint::{ensure_active, yield_point};
use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Perturbs the RGB channels of a surface in square chunks
#[derive(Debug, Clone, Copy)]
pub struct NoiseInjector {
    chunk_size: u32,
    stride: usize,
    amount: f32,
}

impl NoiseInjector {
    /// Create an injector
    pub const fn new(chunk_size: u32, stride: usize, amount: f32) -> Self {
        Self {
            chunk_size,
            stride,
            amount,
        }
    }

    /// Create an injector from pipeline configuration
    pub const fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(
            config.noise_chunk_size,
            config.noise_stride,
            config.noise_amount,
        )
    }

    /// Peak perturbation
    pub const fn amount(&self) -> f32 {
        self.amount
    }

    /// Chunks the surface is processed in, row-major
    pub fn plan(&self, surface: &Surface) -> Vec<Chunk> {
        square_chunks(surface.width(), surface.height(), self.chunk_size)
    }

    /// Apply noise to every chunk of `surface` in place
    ///
    /// An amount of zero leaves the surface untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`](crate::SynthesisError::Cancelled) if the token
    /// fires between chunks; chunks already written keep their noise
    pub async fn inject<R: Rng + Send>(
        &self,
        surface: &mut Surface,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if self.amount == 0.0 {
            return Ok(());
        }

        let chunks = self.plan(surface);
        tracing::debug!(
            chunks = chunks.len(),
            amount = self.amount,
            stride = self.stride,
            "injecting noise"
        );

        for chunk in chunks {
            ensure_active(cancel, "noise injection")?;
            let mut block = surface.read_chunk(chunk);
            perturb_block(&mut block, self.amount, self.stride, rng);
            surface.write_chunk(chunk, &block);
            yield_point().await;
        }

        Ok(())
    }
}

/// Apply strided noise to a linear RGBA buffer
///
/// Each window of `stride` pixels receives the same offset
/// `(uniform(0, 1) - 0.5) * amount` on R, G and B, rounded and clamped to
/// 0-255. Alpha bytes are never written. A trailing partial pixel is left
/// untouched.
pub fn perturb_block<R: Rng>(data: &mut [u8], amount: f32, stride: usize, rng: &mut R) {
    let window = stride.max(1) * BYTES_PER_PIXEL;

    for pixels in data.chunks_mut(window) {
        let delta = (rng.random::<f32>() - 0.5) * amount;
        for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            for channel in pixel.iter_mut().take(3) {
                *channel = (f32::from(*channel) + delta).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
