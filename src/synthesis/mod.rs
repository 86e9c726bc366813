/// Seam between orchestration and whatever performs synthesis
pub mod backend;
/// Cancellation checks and cooperative yields
pub mod checkpoint;
/// Chunked tiling of a tile into a grid surface
pub mod compositor;
/// Low-frequency noise over chunked regions
pub mod noise;
/// Per-image tiling options
pub mod options;
/// Decode, size, composite, perturb and encode one image
pub mod pipeline;
