//! Disjoint rectangular partitions of a surface
//!
//! Chunks are the unit of incremental work for compositing and noise
//! injection. Every partition produced here covers its surface exactly
//! once, in row-major order.

/// Rectangular sub-region of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Chunk {
    /// Number of pixels covered
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the pixel at (`px`, `py`) lies inside the chunk
    pub const fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Partition a surface into square chunks of `edge` pixels
///
/// Chunks on the right and bottom borders are truncated to the surface.
/// An `edge` of zero is treated as one.
pub fn square_chunks(width: u32, height: u32, edge: u32) -> Vec<Chunk> {
    let edge = edge.max(1);
    let mut chunks = Vec::new();

    for y in (0..height).step_by(edge as usize) {
        for x in (0..width).step_by(edge as usize) {
            chunks.push(Chunk {
                x,
                y,
                width: edge.min(width - x),
                height: edge.min(height - y),
            });
        }
    }

    chunks
}

/// Consecutive grid cells of one row drawn as a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRun {
    /// Grid row of the run
    pub row: u32,
    /// First grid column in the run
    pub first_col: u32,
    /// Number of cells in the run
    pub cells: u32,
}

impl CellRun {
    /// Grid columns covered by the run
    pub const fn columns(&self) -> std::ops::Range<u32> {
        self.first_col..self.first_col + self.cells
    }
}

/// Partition a `cols` × `rows` grid into runs of grid cells
///
/// Each run spans up to `cells_per_chunk` consecutive cells of one grid
/// row, so a chunk boundary always falls on a cell boundary. Runs are
/// emitted row-major.
pub fn cell_runs(cols: u32, rows: u32, cells_per_chunk: u32) -> Vec<CellRun> {
    let run = cells_per_chunk.max(1);
    let mut runs = Vec::new();

    for row in 0..rows {
        for first_col in (0..cols).step_by(run as usize) {
            runs.push(CellRun {
                row,
                first_col,
                cells: run.min(cols - first_col),
            });
        }
    }

    runs
}
