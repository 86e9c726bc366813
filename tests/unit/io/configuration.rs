//! Tests for configuration defaults and validation

#[cfg(test)]
mod tests {
    use seamtile::SynthesisError;
    use seamtile::io::configuration::{
        BatchConfig, DEFAULT_BATCH_SIZE, DRY_RUN_JPEG_QUALITY, FailurePolicy, MAX_SURFACE_PIXELS,
        MAX_TEXTURE_SIZE, NOISE_AMOUNT, NOISE_CHUNK_SIZE, NOISE_STRIDE, SynthesisConfig,
    };
    use seamtile::io::image::OutputFormat;

    // Tests defaults carry the documented constants
    // Verified by changing a default away from its constant
    #[test]
    fn test_synthesis_defaults() {
        let config = SynthesisConfig::default();

        assert_eq!(config.max_texture_size, MAX_TEXTURE_SIZE);
        assert_eq!(config.max_surface_pixels, MAX_SURFACE_PIXELS);
        assert_eq!(config.noise_chunk_size, NOISE_CHUNK_SIZE);
        assert_eq!(config.noise_stride, NOISE_STRIDE);
        assert!((config.noise_amount - NOISE_AMOUNT).abs() < f32::EPSILON);
        assert!(!config.strict_size);
        assert!(config.noise_seed.is_none());
        assert!(config.validate().is_ok());
    }

    // Tests dry runs select the relaxed encoding
    // Verified by ignoring the dry-run flag
    #[test]
    fn test_format_for_dry_run() {
        let config = SynthesisConfig::default();

        assert_eq!(config.format_for(false), OutputFormat::Png);
        assert_eq!(
            config.format_for(true),
            OutputFormat::Jpeg {
                quality: DRY_RUN_JPEG_QUALITY
            }
        );
    }

    // Tests each out-of-range tunable is named in the error
    // Verified by skipping the stride check
    #[test]
    fn test_validation_names_parameter() {
        let cases = [
            (
                SynthesisConfig {
                    max_texture_size: 0,
                    ..SynthesisConfig::default()
                },
                "max_texture_size",
            ),
            (
                SynthesisConfig {
                    noise_stride: 0,
                    ..SynthesisConfig::default()
                },
                "noise_stride",
            ),
            (
                SynthesisConfig {
                    max_surface_pixels: 0,
                    ..SynthesisConfig::default()
                },
                "max_surface_pixels",
            ),
            (
                SynthesisConfig {
                    noise_amount: f32::NAN,
                    ..SynthesisConfig::default()
                },
                "noise_amount",
            ),
            (
                SynthesisConfig {
                    noise_amount: -1.0,
                    ..SynthesisConfig::default()
                },
                "noise_amount",
            ),
            (
                SynthesisConfig {
                    dry_run_format: OutputFormat::Jpeg { quality: 0 },
                    ..SynthesisConfig::default()
                },
                "dry_run_format",
            ),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(SynthesisError::InvalidParameter { parameter, .. }) => {
                    assert_eq!(parameter, expected);
                }
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_batch_config() {
        let config = BatchConfig::default();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert!(config.validate().is_ok());

        let zero = BatchConfig {
            batch_size: 0,
            ..config
        };
        assert!(matches!(
            zero.validate(),
            Err(SynthesisError::InvalidParameter {
                parameter: "batch_size",
                ..
            })
        ));
    }
}
