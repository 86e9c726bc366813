//! Grid compositing from a single resampled tile
//!
//! The source is resampled once into a tile-sized surface. That surface is
//! then blitted into the destination cell by cell, one chunk of cells at a
//! time, with a cooperative yield between chunks. Cells follow a
//! [`GridLayout`], so with a fractional extent some cells are one pixel
//! narrower than the tile and receive a cropped copy.

use crate::io::configuration::SynthesisConfig;
use crate::io::error::{Result, invalid_parameter};
use crate::surface::buffer::{SourceImage, Surface};
use crate::surface::chunk::{CellRun, cell_runs};
use crate::surface::ledger::SurfaceLedger;
use crate::surface::size::{GridLayout, ScaledTileSize};
use crate::synthesis::checkpoint::{ensure_active, yield_point};
use image::imageops::{self, FilterType};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Draws a tile repeatedly into a grid-sized surface
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    cells_per_chunk: u32,
    filter: FilterType,
}

impl Compositor {
    /// Create a compositor blitting `cells_per_chunk` cells between yields
    pub const fn new(cells_per_chunk: u32, filter: FilterType) -> Self {
        Self {
            cells_per_chunk,
            filter,
        }
    }

    /// Create a compositor from pipeline configuration
    pub const fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.cells_per_chunk, config.resize_filter)
    }

    /// Resample the source into a tile-sized surface
    ///
    /// A source already at the target size is copied unfiltered.
    pub fn resample(
        &self,
        source: &SourceImage,
        size: ScaledTileSize,
        ledger: &Arc<SurfaceLedger>,
    ) -> Surface {
        let pixels = if (source.width(), source.height()) == (size.width, size.height) {
            source.pixels().clone()
        } else {
            imageops::resize(source.pixels(), size.width, size.height, self.filter)
        };
        Surface::from_image(pixels, ledger)
    }

    /// Runs of cells the destination is drawn in, row-major
    pub fn plan(&self, layout: &GridLayout) -> Vec<CellRun> {
        cell_runs(layout.cols(), layout.rows(), self.cells_per_chunk)
    }

    /// Composite `tile` into a fresh surface laid out by `layout`
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the tile cannot cover the cells
    /// and [`Cancelled`](crate::SynthesisError::Cancelled) if the token fires
    /// between chunks
    pub async fn composite(
        &self,
        tile: &Surface,
        layout: &GridLayout,
        ledger: &Arc<SurfaceLedger>,
        cancel: &CancellationToken,
    ) -> Result<Surface> {
        check_tile(tile, layout)?;
        let mut destination = Surface::new(layout.width(), layout.height(), ledger)?;
        self.composite_into(tile, &mut destination, layout, cancel)
            .await?;
        Ok(destination)
    }

    /// Composite `tile` into an existing destination of exactly layout size
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the tile cannot cover the cells
    /// or the destination size does not match the layout, and
    /// [`Cancelled`](crate::SynthesisError::Cancelled) if the token fires
    /// between chunks
    pub async fn composite_into(
        &self,
        tile: &Surface,
        destination: &mut Surface,
        layout: &GridLayout,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_tile(tile, layout)?;
        let expected = (layout.width(), layout.height());
        let actual = (destination.width(), destination.height());
        if expected != actual {
            return Err(invalid_parameter(
                "destination",
                &format!("{}x{}", actual.0, actual.1),
                &format!("grid requires {}x{}", expected.0, expected.1),
            ));
        }

        let runs = self.plan(layout);
        tracing::debug!(
            chunks = runs.len(),
            tile_width = tile.width(),
            tile_height = tile.height(),
            width = layout.width(),
            height = layout.height(),
            "compositing grid"
        );

        for run in runs {
            ensure_active(cancel, "compositing")?;
            for col in run.columns() {
                destination.blit_cell(tile, layout.cell(col, run.row));
            }
            yield_point().await;
        }

        Ok(())
    }
}

fn check_tile(tile: &Surface, layout: &GridLayout) -> Result<()> {
    let needed = layout.tile_size();
    if tile.width() < needed.width || tile.height() < needed.height {
        return Err(invalid_parameter(
            "tile",
            &format!("{}x{}", tile.width(), tile.height()),
            &format!("cells need a tile of at least {}x{}", needed.width, needed.height),
        ));
    }
    Ok(())
}
