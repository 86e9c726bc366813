//! Execution seam between the orchestrator and where synthesis runs

use crate::io::error::Result;
use crate::io::image::EncodedImage;
use crate::synthesis::options::TileOptions;
use crate::synthesis::pipeline::Pipeline;
use std::future::Future;

/// Something that turns source bytes into an encoded grid image
///
/// Implemented by the inline [`Pipeline`] and by the offload handles, so
/// batches run the same way on the caller's runtime or on worker threads.
pub trait SynthesisBackend: Send + Sync + 'static {
    /// Synthesize one image
    ///
    /// # Errors
    ///
    /// Returns the per-item failure for this image
    fn run(
        &self,
        image: Vec<u8>,
        options: TileOptions,
    ) -> impl Future<Output = Result<EncodedImage>> + Send;
}

impl SynthesisBackend for Pipeline {
    fn run(
        &self,
        image: Vec<u8>,
        options: TileOptions,
    ) -> impl Future<Output = Result<EncodedImage>> + Send {
        async move { self.synthesize(&image, &options).await }
    }
}
