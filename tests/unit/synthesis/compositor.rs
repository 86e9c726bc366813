//! Tests for resampling and chunked grid compositing

#[cfg(test)]
mod tests {
    use crate::support::{gradient, solid};
    use image::imageops::FilterType;
    use seamtile::SynthesisError;
    use seamtile::io::configuration::MAX_SURFACE_PIXELS;
    use seamtile::surface::buffer::{SourceImage, Surface};
    use seamtile::surface::ledger::SurfaceLedger;
    use seamtile::surface::size::{GridLayout, ScaledTileSize};
    use seamtile::synthesis::compositor::Compositor;
    use tokio_util::sync::CancellationToken;

    fn compositor() -> Compositor {
        Compositor::new(1, FilterType::Triangle)
    }

    fn layout(width: u32, height: u32, cols: u32, rows: u32) -> GridLayout {
        GridLayout::uniform(ScaledTileSize { width, height }, cols, rows, MAX_SURFACE_PIXELS)
            .expect("layout fits")
    }

    // Tests every grid cell is an exact copy of the tile
    // Verified by blitting columns at the tile height stride
    #[tokio::test]
    async fn test_composite_repeats_tile() {
        let ledger = SurfaceLedger::new();
        let tile = Surface::from_image(gradient(5, 3), &ledger);

        let grid = compositor()
            .composite(&tile, &layout(5, 3, 4, 3), &ledger, &CancellationToken::new())
            .await
            .expect("composite succeeds");

        assert_eq!((grid.width(), grid.height()), (20, 9));
        for y in 0..9 {
            for x in 0..20 {
                assert_eq!(
                    grid.pixels().get_pixel(x, y),
                    tile.pixels().get_pixel(x % 5, y % 3),
                    "mismatch at ({x}, {y})"
                );
            }
        }
    }

    // Tests fractional cells crop the tile at each cell origin
    // Verified by placing cells at whole multiples of the tile width
    #[tokio::test]
    async fn test_composite_fractional_cells() {
        let ledger = SurfaceLedger::new();
        let grid_layout =
            GridLayout::new(1.5, 2.0, 4, 1, MAX_SURFACE_PIXELS).expect("layout fits");
        let tile = Surface::from_image(gradient(2, 2), &ledger);

        let grid = compositor()
            .composite(&tile, &grid_layout, &ledger, &CancellationToken::new())
            .await
            .expect("composite succeeds");

        assert_eq!((grid.width(), grid.height()), (6, 2));
        // Cells span [0, 2), [2, 3), [3, 5) and [5, 6)
        let tile_columns = [0, 1, 0, 0, 1, 0];
        for (x, y, pixel) in grid.pixels().enumerate_pixels() {
            let column = tile_columns.get(x as usize).copied().unwrap_or_default();
            assert_eq!(pixel, tile.pixels().get_pixel(column, y), "at ({x}, {y})");
        }
    }

    // Tests multi-cell chunks draw the same grid as single-cell chunks
    // Verified by blitting only the first cell of each run
    #[tokio::test]
    async fn test_chunk_size_does_not_change_output() {
        let ledger = SurfaceLedger::new();
        let tile = Surface::from_image(gradient(4, 4), &ledger);
        let cancel = CancellationToken::new();
        let grid_layout = layout(4, 4, 5, 2);

        let single = compositor()
            .composite(&tile, &grid_layout, &ledger, &cancel)
            .await
            .expect("composite succeeds");
        let wide = Compositor::new(3, FilterType::Triangle)
            .composite(&tile, &grid_layout, &ledger, &cancel)
            .await
            .expect("composite succeeds");

        assert_eq!(single.pixels(), wide.pixels());
        assert_eq!(Compositor::new(3, FilterType::Triangle).plan(&grid_layout).len(), 4);
    }

    // Tests a cancelled token stops before the first chunk
    // Verified by checking the token only after the loop
    #[tokio::test]
    async fn test_composite_cancelled() {
        let ledger = SurfaceLedger::new();
        let tile = Surface::from_image(solid(2, 2, [1, 1, 1, 255]), &ledger);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = compositor()
            .composite(&tile, &layout(2, 2, 2, 2), &ledger, &cancel)
            .await;

        assert!(matches!(result, Err(SynthesisError::Cancelled { .. })));
        assert_eq!(ledger.live_bytes(), 2 * 2 * 4);
    }

    // Tests a destination of the wrong size is rejected
    // Verified by compositing into whatever destination is given
    #[tokio::test]
    async fn test_composite_into_checks_destination() {
        let ledger = SurfaceLedger::new();
        let tile = Surface::from_image(solid(3, 3, [0, 0, 0, 255]), &ledger);
        let mut destination = Surface::new(6, 5, &ledger).expect("small surface");

        let result = compositor()
            .composite_into(
                &tile,
                &mut destination,
                &layout(3, 3, 2, 2),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(SynthesisError::InvalidParameter {
                parameter: "destination",
                ..
            })
        ));
    }

    // Tests a tile smaller than the cells is rejected before allocating
    // Verified by letting small tiles leave gaps between cells
    #[tokio::test]
    async fn test_composite_rejects_small_tile() {
        let ledger = SurfaceLedger::new();
        let mut tile = Surface::from_image(solid(3, 3, [0, 0, 0, 255]), &ledger);

        let result = compositor()
            .composite(&tile, &layout(4, 3, 2, 2), &ledger, &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(SynthesisError::InvalidParameter {
                parameter: "tile",
                ..
            })
        ));
        assert_eq!(ledger.acquisitions(), 1);

        tile.release();
        let mut destination = Surface::new(6, 6, &ledger).expect("small surface");
        let released = compositor()
            .composite_into(
                &tile,
                &mut destination,
                &layout(3, 3, 2, 2),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(
            released,
            Err(SynthesisError::InvalidParameter {
                parameter: "tile",
                ..
            })
        ));
    }

    // Tests resampling to the source size keeps pixels untouched
    // Verified by always running the resize filter
    #[test]
    fn test_resample_identity_and_scaled() {
        let ledger = SurfaceLedger::new();
        let source = SourceImage::from_rgba(gradient(6, 4)).expect("source");

        let same = compositor().resample(
            &source,
            ScaledTileSize {
                width: 6,
                height: 4,
            },
            &ledger,
        );
        assert_eq!(same.pixels(), source.pixels());

        let half = compositor().resample(
            &source,
            ScaledTileSize {
                width: 3,
                height: 2,
            },
            &ledger,
        );
        assert_eq!((half.width(), half.height()), (3, 2));
        assert_eq!(ledger.live_bytes(), (6 * 4 + 3 * 2) * 4);
    }
}
