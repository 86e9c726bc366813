//! Tests for the synthesis backend seam

#[cfg(test)]
mod tests {
    use crate::support::{gradient, png_bytes};
    use seamtile::SynthesisError;
    use seamtile::io::configuration::SynthesisConfig;
    use seamtile::io::image::EncodedImage;
    use seamtile::synthesis::backend::SynthesisBackend;
    use seamtile::synthesis::options::TileOptions;
    use seamtile::synthesis::pipeline::Pipeline;
    use std::sync::Arc;

    async fn run_shared<B: SynthesisBackend>(
        backend: Arc<B>,
        image: Vec<u8>,
    ) -> seamtile::Result<EncodedImage> {
        tokio::spawn(async move { backend.run(image, TileOptions::grid(3, 1, 1.0)).await })
            .await
            .map_err(|e| SynthesisError::TaskFailed {
                index: 0,
                reason: e.to_string(),
            })?
    }

    // Tests the inline pipeline satisfies the backend contract on spawned tasks
    // Verified by running synthesis on the caller without spawning
    #[tokio::test]
    async fn test_pipeline_backend_runs_on_spawned_task() {
        let backend = Arc::new(Pipeline::new(SynthesisConfig::default()).expect("valid config"));

        let encoded = run_shared(Arc::clone(&backend), png_bytes(&gradient(4, 4)))
            .await
            .expect("synthesis succeeds");
        assert_eq!((encoded.width, encoded.height), (12, 4));

        let failed = run_shared(backend, b"nope".to_vec()).await;
        assert!(matches!(failed, Err(SynthesisError::Decode { .. })));
    }
}
