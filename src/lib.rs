//! Tiled image synthesis from seamless source tiles
//!
//! A source image is resampled to a bounded tile size, repeated across a
//! grid in cooperative chunks, optionally perturbed with low-frequency
//! noise and encoded. Batches of sources run in bounded concurrent groups,
//! either inline or on dedicated offload workers.

#![forbid(unsafe_code)]

/// Grouped batch execution, ordering and per-item reports
pub mod batch;
/// Input/output operations, configuration and error handling
pub mod io;
/// Offloaded synthesis over request/response channels
pub mod offload;
/// Pixel surfaces, chunk planning and size calculation
pub mod surface;
/// Compositing, noise injection and the synthesis pipeline
pub mod synthesis;

pub use io::error::{Result, SynthesisError};
