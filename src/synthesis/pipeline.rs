//! Source bytes to encoded grid image
//!
//! Steps, in order: decode, size and lay out the grid, resample once,
//! composite, optional noise, encode. Every size limit is checked before
//! the first surface is allocated. Dry runs keep sizing and compositing
//! intact and only skip noise and relax the encoding.

use crate::io::configuration::SynthesisConfig;
use crate::io::error::Result;
use crate::io::image::{EncodedImage, decode_source, encode_surface};
use crate::surface::buffer::SourceImage;
use crate::surface::ledger::SurfaceLedger;
use crate::surface::size::{
    GridLayout, ScaledTileSize, compute_scaled_size, compute_scaled_size_strict, is_clamped,
    tile_extent,
};
use crate::synthesis::checkpoint::ensure_active;
use crate::synthesis::compositor::Compositor;
use crate::synthesis::noise::NoiseInjector;
use crate::synthesis::options::TileOptions;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Single-image synthesis with explicit configuration
///
/// Every call creates its own surfaces and releases them before returning,
/// so one pipeline may serve many concurrent calls.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: SynthesisConfig,
    ledger: Arc<SurfaceLedger>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Create a pipeline after validating `config`
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if any tunable is out of range
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ledger: SurfaceLedger::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Account surfaces against a shared ledger
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<SurfaceLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Observe `cancel` at every chunk boundary
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Active configuration
    pub const fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Ledger receiving surface leases
    pub const fn ledger(&self) -> &Arc<SurfaceLedger> {
        &self.ledger
    }

    /// Token observed at cancellation points
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Decode `source` and synthesize the grid image
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for bad options,
    /// [`Decode`](crate::SynthesisError::Decode) for unreadable input,
    /// [`Encode`](crate::SynthesisError::Encode) if the result cannot be
    /// serialized and [`Cancelled`](crate::SynthesisError::Cancelled) when
    /// the token fires
    #[tracing::instrument(
        skip_all,
        fields(bytes = source.len(), cols = options.cols, rows = options.rows, scale = options.scale)
    )]
    pub async fn synthesize(&self, source: &[u8], options: &TileOptions) -> Result<EncodedImage> {
        options.validate()?;
        ensure_active(&self.cancel, "decoding")?;
        let image = decode_source(source, self.config.max_source_pixels)?;
        self.synthesize_source(&image, options).await
    }

    /// Synthesize the grid image from an already decoded source
    ///
    /// # Errors
    ///
    /// Same as [`Self::synthesize`] minus decoding failures
    pub async fn synthesize_source(
        &self,
        source: &SourceImage,
        options: &TileOptions,
    ) -> Result<EncodedImage> {
        let layout = self.layout(source, options)?;
        let compositor = Compositor::from_config(&self.config);

        let mut tile = compositor.resample(source, layout.tile_size(), &self.ledger);
        let mut surface = compositor
            .composite(&tile, &layout, &self.ledger, &self.cancel)
            .await?;
        tile.release();

        if options.wants_noise() {
            let mut rng = self.noise_rng();
            NoiseInjector::from_config(&self.config)
                .inject(&mut surface, &mut rng, &self.cancel)
                .await?;
        }

        let format = self.config.format_for(options.dry_run);
        let encoded = encode_surface(&surface, format);
        surface.release();
        let encoded = encoded?;

        debug!(
            width = encoded.width,
            height = encoded.height,
            format = format.name(),
            bytes = encoded.bytes.len(),
            "encoded grid"
        );
        Ok(encoded)
    }

    /// Tile size for `source` at `scale` under the configured limits
    ///
    /// # Errors
    ///
    /// Returns [`SizeConstraintExceeded`](crate::SynthesisError::SizeConstraintExceeded)
    /// in strict mode when the tile would be clamped
    pub fn tile_size(&self, source: &SourceImage, scale: f64) -> Result<ScaledTileSize> {
        let (width, height) = (source.width(), source.height());
        if self.config.strict_size {
            return compute_scaled_size_strict(width, height, scale, self.config.max_texture_size);
        }

        let size = compute_scaled_size(width, height, scale, self.config.max_texture_size);
        if is_clamped(size, width, height, scale) {
            warn!(
                source_width = width,
                source_height = height,
                scale,
                tile_width = size.width,
                tile_height = size.height,
                "tile clamped to texture limit"
            );
        }
        Ok(size)
    }

    /// Grid placement for `source` under `options` and the configured limits
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for bad options and
    /// [`SizeConstraintExceeded`](crate::SynthesisError::SizeConstraintExceeded)
    /// if the tile is clamped in strict mode or the destination would exceed
    /// the surface pixel limit
    pub fn layout(&self, source: &SourceImage, options: &TileOptions) -> Result<GridLayout> {
        options.validate()?;
        self.tile_size(source, options.scale)?;
        let (cell_width, cell_height) = tile_extent(
            source.width(),
            source.height(),
            options.scale,
            self.config.max_texture_size,
        );
        GridLayout::new(
            cell_width,
            cell_height,
            options.cols,
            options.rows,
            self.config.max_surface_pixels,
        )
    }

    fn noise_rng(&self) -> StdRng {
        self.config
            .noise_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }
}
