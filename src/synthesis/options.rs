//! Per-request grid and mode options

use crate::io::error::{Result, invalid_parameter};
use serde::{Deserialize, Serialize};

/// Grid layout and mode for one synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileOptions {
    /// Tiles per row
    pub cols: u32,
    /// Tiles per column
    pub rows: u32,
    /// Scale factor applied to the source tile
    pub scale: f64,
    /// Perturb the composite with noise
    #[serde(default)]
    pub add_noise: bool,
    /// Trade output fidelity for speed
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            cols: 2,
            rows: 2,
            scale: 1.0,
            add_noise: false,
            dry_run: false,
        }
    }
}

impl TileOptions {
    /// Options for a `cols` × `rows` grid at `scale`
    pub const fn grid(cols: u32, rows: u32, scale: f64) -> Self {
        Self {
            cols,
            rows,
            scale,
            add_noise: false,
            dry_run: false,
        }
    }

    /// Enable or disable noise
    #[must_use]
    pub const fn with_noise(mut self, add_noise: bool) -> Self {
        self.add_noise = add_noise;
        self
    }

    /// Enable or disable dry-run mode
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether the pipeline will inject noise for these options
    ///
    /// Dry runs never inject noise.
    pub const fn wants_noise(&self) -> bool {
        self.add_noise && !self.dry_run
    }

    /// Check grid counts and scale
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if a grid count is zero or the
    /// scale is not a finite positive number
    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 {
            return Err(invalid_parameter("cols", &self.cols, &"must be at least 1"));
        }
        if self.rows == 0 {
            return Err(invalid_parameter("rows", &self.rows, &"must be at least 1"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(invalid_parameter(
                "scale",
                &self.scale,
                &"must be a finite number greater than zero",
            ));
        }
        Ok(())
    }
}
