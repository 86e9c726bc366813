//! Tests for source rasters and leased destination surfaces

#[cfg(test)]
mod tests {
    use crate::support::{gradient, solid};
    use image::{Rgba, RgbaImage};
    use seamtile::SynthesisError;
    use seamtile::surface::buffer::{BYTES_PER_PIXEL, SourceImage, Surface, buffer_len};
    use seamtile::surface::chunk::Chunk;
    use seamtile::surface::ledger::SurfaceLedger;

    // Tests sources with an empty axis are rejected
    // Verified by accepting zero-width rasters
    #[test]
    fn test_source_rejects_empty_axis() {
        assert!(matches!(
            SourceImage::from_rgba(RgbaImage::new(0, 4)),
            Err(SynthesisError::Decode { .. })
        ));
        assert!(matches!(
            SourceImage::from_rgba(RgbaImage::new(4, 0)),
            Err(SynthesisError::Decode { .. })
        ));

        let source = SourceImage::from_rgba(gradient(3, 2)).expect("non-empty source");
        assert_eq!((source.width(), source.height()), (3, 2));
    }

    #[test]
    fn test_buffer_len() {
        assert!(matches!(buffer_len(10, 5), Ok(200)));
        assert_eq!(BYTES_PER_PIXEL, 4);
    }

    // Tests surfaces lease their bytes and return them on release
    // Verified by keeping the lease after release
    #[test]
    fn test_surface_release_returns_lease() {
        let ledger = SurfaceLedger::new();
        let mut surface = Surface::new(8, 4, &ledger).expect("small surface");

        assert_eq!(ledger.live_bytes(), 8 * 4 * 4);
        assert!(!surface.is_released());

        surface.release();
        assert!(surface.is_released());
        assert_eq!((surface.width(), surface.height()), (0, 0));
        assert_eq!(ledger.live_bytes(), 0);
    }

    // Tests dropping a surface without release also returns its bytes
    // Verified by only returning bytes from release
    #[test]
    fn test_surface_drop_returns_lease() {
        let ledger = SurfaceLedger::new();
        {
            let _surface = Surface::from_image(solid(5, 5, [1, 2, 3, 4]), &ledger);
            assert_eq!(ledger.live_bytes(), 100);
        }
        assert_eq!(ledger.live_bytes(), 0);
        assert_eq!(ledger.peak_bytes(), 100);
    }

    // Tests a cell blit copies the tile exactly at the cell origin
    // Verified by offsetting the blit origin by one pixel
    #[test]
    fn test_blit_cell_places_tile() {
        let ledger = SurfaceLedger::new();
        let tile = Surface::from_image(gradient(3, 3), &ledger);
        let mut destination = Surface::new(6, 3, &ledger).expect("small surface");

        destination.blit_cell(
            &tile,
            Chunk {
                x: 3,
                y: 0,
                width: 3,
                height: 3,
            },
        );

        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(
                    destination.pixels().get_pixel(x + 3, y),
                    tile.pixels().get_pixel(x, y)
                );
                assert_eq!(destination.pixels().get_pixel(x, y), &Rgba([0, 0, 0, 0]));
            }
        }
    }

    // Tests a narrower cell receives a cropped tile and nothing spills over
    // Verified by blitting the whole tile at the cell origin
    #[test]
    fn test_blit_cell_crops_to_cell() {
        let ledger = SurfaceLedger::new();
        let tile = Surface::from_image(gradient(3, 3), &ledger);
        let mut destination = Surface::new(6, 3, &ledger).expect("small surface");

        destination.blit_cell(
            &tile,
            Chunk {
                x: 1,
                y: 1,
                width: 2,
                height: 1,
            },
        );

        for (x, y, pixel) in destination.pixels().enumerate_pixels() {
            if y == 1 && (1..3).contains(&x) {
                assert_eq!(pixel, tile.pixels().get_pixel(x - 1, 0));
            } else {
                assert_eq!(pixel, &Rgba([0, 0, 0, 0]), "spill at ({x}, {y})");
            }
        }
    }

    // Tests chunks read out and write back in place
    // Verified by writing the block at the surface origin
    #[test]
    fn test_chunk_read_write() {
        let ledger = SurfaceLedger::new();
        let mut surface = Surface::from_image(solid(4, 4, [10, 10, 10, 255]), &ledger);
        let chunk = Chunk {
            x: 2,
            y: 1,
            width: 2,
            height: 2,
        };

        let mut block = surface.read_chunk(chunk);
        assert_eq!(block.dimensions(), (2, 2));
        for pixel in block.pixels_mut() {
            *pixel = Rgba([99, 99, 99, 255]);
        }
        surface.write_chunk(chunk, &block);

        assert_eq!(surface.pixels().get_pixel(3, 2), &Rgba([99, 99, 99, 255]));
        assert_eq!(surface.pixels().get_pixel(1, 1), &Rgba([10, 10, 10, 255]));
        assert_eq!(surface.pixels().get_pixel(2, 0), &Rgba([10, 10, 10, 255]));
    }
}
