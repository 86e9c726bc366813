//! Scaled tile dimensions and grid placement under surface limits

use crate::io::error::{Result, SynthesisError, invalid_parameter};
use crate::surface::chunk::Chunk;

/// Dimensions of one scaled tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledTileSize {
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
}

/// Largest permitted tile extent on either axis for `scale`
///
/// The divisor grows with `sqrt(scale)` once scale exceeds 4, trading
/// fidelity for staying inside practical surface limits.
pub fn max_axis(max_texture_size: u32, scale: f64) -> f64 {
    f64::from(max_texture_size) / scale.sqrt().max(2.0)
}

/// Compute the size of one scaled tile
///
/// Each axis is `source * scale` rounded to whole pixels, clamped to
/// [`max_axis`] and never below one pixel. Clamping is silent; compare
/// against [`nominal_size`] to detect it.
pub fn compute_scaled_size(
    source_width: u32,
    source_height: u32,
    scale: f64,
    max_texture_size: u32,
) -> ScaledTileSize {
    let (width, height) = tile_extent(source_width, source_height, scale, max_texture_size);

    ScaledTileSize {
        width: width.round() as u32,
        height: height.round() as u32,
    }
}

/// Fractional tile size after clamping, at least one pixel per axis
///
/// Grid placement works from this extent so rounding happens once per
/// surface edge rather than once per tile.
pub fn tile_extent(
    source_width: u32,
    source_height: u32,
    scale: f64,
    max_texture_size: u32,
) -> (f64, f64) {
    let limit = max_axis(max_texture_size, scale).floor().max(1.0);
    let (nominal_width, nominal_height) = nominal_size(source_width, source_height, scale);
    (
        nominal_width.min(limit).max(1.0),
        nominal_height.min(limit).max(1.0),
    )
}

/// Unclamped tile size as fractional pixels
pub fn nominal_size(source_width: u32, source_height: u32, scale: f64) -> (f64, f64) {
    (
        f64::from(source_width) * scale,
        f64::from(source_height) * scale,
    )
}

/// Whether the scaled size was reduced by the texture limit
pub fn is_clamped(size: ScaledTileSize, source_width: u32, source_height: u32, scale: f64) -> bool {
    let (nominal_width, nominal_height) = nominal_size(source_width, source_height, scale);
    f64::from(size.width) < nominal_width.round().max(1.0)
        || f64::from(size.height) < nominal_height.round().max(1.0)
}

/// Compute the scaled tile size, rejecting any clamping
///
/// # Errors
///
/// Returns [`SynthesisError::SizeConstraintExceeded`] naming the first axis
/// whose nominal size exceeds the permitted maximum
pub fn compute_scaled_size_strict(
    source_width: u32,
    source_height: u32,
    scale: f64,
    max_texture_size: u32,
) -> Result<ScaledTileSize> {
    let size = compute_scaled_size(source_width, source_height, scale, max_texture_size);
    if !is_clamped(size, source_width, source_height, scale) {
        return Ok(size);
    }

    let limit = max_axis(max_texture_size, scale);
    let (nominal_width, nominal_height) = nominal_size(source_width, source_height, scale);
    let (axis, requested) = if f64::from(size.width) < nominal_width.round() {
        ("width", nominal_width)
    } else {
        ("height", nominal_height)
    };

    Err(SynthesisError::SizeConstraintExceeded {
        axis,
        requested,
        limit,
    })
}

/// Tolerance for float error when deciding whether an extent is whole
const WHOLE_PIXEL_TOLERANCE: f64 = 1e-9;

/// Placement of `cols` × `rows` cells of a fractional extent on a surface
///
/// The surface measures `round(extent * count)` on each axis and cell `c`
/// starts at `round(c * extent)`. Neighbouring cells therefore differ by
/// at most one pixel and the whole grid is within 1px of its nominal size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    cell_width: f64,
    cell_height: f64,
    cols: u32,
    rows: u32,
    width: u32,
    height: u32,
}

impl GridLayout {
    /// Lay out cells of `cell_width` × `cell_height` pixels
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for an extent below one pixel or an
    /// empty grid, and [`SynthesisError::SizeConstraintExceeded`] if an axis
    /// overflows a `u32` or the area exceeds `max_pixels`
    pub fn new(
        cell_width: f64,
        cell_height: f64,
        cols: u32,
        rows: u32,
        max_pixels: u64,
    ) -> Result<Self> {
        let usable = cell_width >= 1.0 && cell_height >= 1.0 && cols > 0 && rows > 0;
        if !usable {
            return Err(invalid_parameter(
                "grid",
                &format!("{cols}x{rows} cells of {cell_width}x{cell_height}"),
                &"cells need at least one pixel per axis and one cell per axis",
            ));
        }

        let width = surface_axis("width", cell_width, cols)?;
        let height = surface_axis("height", cell_height, rows)?;
        let area = u64::from(width) * u64::from(height);
        if area > max_pixels {
            return Err(SynthesisError::SizeConstraintExceeded {
                axis: "area",
                requested: area as f64,
                limit: max_pixels as f64,
            });
        }

        Ok(Self {
            cell_width,
            cell_height,
            cols,
            rows,
            width,
            height,
        })
    }

    /// Lay out whole-pixel cells of `tile` size
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`]
    pub fn uniform(tile: ScaledTileSize, cols: u32, rows: u32, max_pixels: u64) -> Result<Self> {
        Self::new(
            f64::from(tile.width),
            f64::from(tile.height),
            cols,
            rows,
            max_pixels,
        )
    }

    /// Surface width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cells per row
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Cells per column
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Left edge of column `col`; `cols` gives the surface width
    pub fn cell_x(&self, col: u32) -> u32 {
        edge(self.cell_width, col).min(self.width)
    }

    /// Top edge of row `row`; `rows` gives the surface height
    pub fn cell_y(&self, row: u32) -> u32 {
        edge(self.cell_height, row).min(self.height)
    }

    /// Pixel bounds of the cell at (`col`, `row`)
    pub fn cell(&self, col: u32, row: u32) -> Chunk {
        let (x, y) = (self.cell_x(col), self.cell_y(row));
        Chunk {
            x,
            y,
            width: self.cell_x(col + 1) - x,
            height: self.cell_y(row + 1) - y,
        }
    }

    /// Smallest tile covering every cell when cropped to it
    pub fn tile_size(&self) -> ScaledTileSize {
        ScaledTileSize {
            width: largest_cell(self.cell_width),
            height: largest_cell(self.cell_height),
        }
    }
}

fn edge(extent: f64, index: u32) -> u32 {
    (extent * f64::from(index)).round() as u32
}

fn largest_cell(extent: f64) -> u32 {
    (extent - WHOLE_PIXEL_TOLERANCE).ceil().max(1.0) as u32
}

fn surface_axis(axis: &'static str, extent: f64, count: u32) -> Result<u32> {
    let requested = (extent * f64::from(count)).round();
    if requested > f64::from(u32::MAX) {
        return Err(SynthesisError::SizeConstraintExceeded {
            axis,
            requested,
            limit: f64::from(u32::MAX),
        });
    }
    Ok(requested as u32)
}
