//! Command-line interface for batch tiling of image files

use crate::batch::orchestrator::Orchestrator;
use crate::batch::report::BatchReport;
use crate::batch::scheduler::BatchProgress;
use crate::io::configuration::{
    BatchConfig, DEFAULT_BATCH_SIZE, FailurePolicy, MAX_SURFACE_PIXELS, MAX_TEXTURE_SIZE,
    NOISE_AMOUNT, OUTPUT_SUFFIX, SynthesisConfig,
};
use crate::io::error::{Result, SynthesisError, invalid_parameter};
use crate::io::image::OutputFormat;
use crate::io::progress::ProgressManager;
use crate::offload::worker::OffloadPool;
use crate::synthesis::options::TileOptions;
use crate::synthesis::pipeline::Pipeline;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};

/// Extensions picked up when the target is a directory
pub const INPUT_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "bmp", "gif"];

#[derive(Parser, Debug)]
#[command(name = "seamtile")]
#[command(
    author,
    version,
    about = "Repeat seamless tiles into large grid images"
)]
/// Command-line arguments for the tiling tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input image file or directory to process
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Tiles per row
    #[arg(short, long, default_value_t = 2)]
    pub cols: u32,

    /// Tiles per column
    #[arg(short, long, default_value_t = 2)]
    pub rows: u32,

    /// Scale factor applied to each tile
    #[arg(short, long, default_value_t = 1.0)]
    pub scale: f64,

    /// Add low-frequency noise to the result
    #[arg(short, long)]
    pub noise: bool,

    /// Faster, lower-fidelity output without noise
    #[arg(short, long)]
    pub dry_run: bool,

    /// Images processed concurrently per batch group
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Offload synthesis to this many worker threads (0 runs inline)
    #[arg(short, long, default_value_t = 0)]
    pub workers: usize,

    /// Peak noise perturbation on the 0-255 scale
    #[arg(long, default_value_t = NOISE_AMOUNT)]
    pub noise_amount: f32,

    /// Maximum texture dimension used to bound tile size
    #[arg(long, default_value_t = MAX_TEXTURE_SIZE)]
    pub max_texture_size: u32,

    /// Largest output image in pixels; bigger grids fail instead of allocating
    #[arg(long, default_value_t = MAX_SURFACE_PIXELS)]
    pub max_surface_pixels: u64,

    /// Fail instead of shrinking oversized tiles
    #[arg(long)]
    pub strict: bool,

    /// Random seed for reproducible noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for output files (defaults to each input's directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process files even if output exists
    #[arg(long)]
    pub no_skip: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Log level selected by the verbosity flags
    pub const fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Per-image options from the grid flags
    pub const fn tile_options(&self) -> TileOptions {
        TileOptions::grid(self.cols, self.rows, self.scale)
            .with_noise(self.noise)
            .with_dry_run(self.dry_run)
    }

    /// Pipeline configuration from the tuning flags
    pub fn synthesis_config(&self) -> SynthesisConfig {
        SynthesisConfig {
            max_texture_size: self.max_texture_size,
            max_surface_pixels: self.max_surface_pixels,
            strict_size: self.strict,
            noise_amount: self.noise_amount,
            noise_seed: self.seed,
            ..SynthesisConfig::default()
        }
    }

    /// Batch configuration from the batching flags
    pub const fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.batch_size,
            failure_policy: FailurePolicy::Continue,
        }
    }
}

/// Reads input files, runs the batch and writes the outputs
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process files according to CLI arguments
    ///
    /// Per-image failures are logged and counted in the returned report;
    /// they do not fail the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid, an input cannot be read,
    /// the runtime cannot start, or an output cannot be written
    pub fn process(&mut self) -> Result<BatchReport> {
        let files = self.collect_files()?;
        if files.is_empty() {
            info!("nothing to process");
            return Ok(BatchReport::default());
        }

        let inputs = files
            .iter()
            .map(|path| {
                std::fs::read(path).map_err(|e| SynthesisError::FileSystem {
                    path: path.clone(),
                    operation: "read input",
                    source: e,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let options = self.cli.tile_options();
        let config = self.cli.synthesis_config();
        let batch = self.cli.batch_config();
        let workers = self.cli.workers;

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| SynthesisError::FileSystem {
                path: self.cli.target.clone(),
                operation: "start runtime",
                source: e,
            })?;

        let progress = &mut self.progress_manager;
        let on_progress = |update: BatchProgress| {
            if let Some(pm) = progress.as_mut() {
                pm.update(update);
            }
        };

        let report = if workers == 0 {
            let orchestrator = Orchestrator::new(Pipeline::new(config)?, batch)?;
            runtime.block_on(orchestrator.process(inputs, options, on_progress))?
        } else {
            let pool = Arc::new(OffloadPool::spawn(
                config,
                workers,
                &CancellationToken::new(),
            )?);
            let orchestrator = Orchestrator::from_shared(Arc::clone(&pool), batch)?;
            let report = runtime.block_on(orchestrator.process(inputs, options, on_progress));
            drop(orchestrator);
            if let Ok(pool) = Arc::try_unwrap(pool) {
                pool.shutdown()?;
            }
            report?
        };

        for (index, image) in report.outputs() {
            let Some(input) = files.get(index) else {
                continue;
            };
            let output_path = self.output_path(input, image.format);
            std::fs::write(&output_path, &image.bytes).map_err(|e| SynthesisError::FileSystem {
                path: output_path.clone(),
                operation: "write output",
                source: e,
            })?;
            info!(input = %input.display(), output = %output_path.display(), "wrote grid");
        }

        for failure in report.failures() {
            if let Some(input) = files.get(failure.index) {
                warn!(input = %input.display(), error = %failure.error, "skipped image");
            }
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish(&report);
        }

        Ok(report)
    }

    /// Inputs selected by the target, sorted by path
    ///
    /// # Errors
    ///
    /// Returns an error if the target is neither a supported image nor a
    /// readable directory
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;
        if target.is_file() {
            if !Self::is_supported_input(target) {
                return Err(invalid_parameter(
                    "target",
                    &target.display(),
                    &"file must be a supported image",
                ));
            }
            Ok(self
                .should_process_file(target)
                .then(|| vec![target.clone()])
                .unwrap_or_default())
        } else if target.is_dir() {
            let entries = std::fs::read_dir(target).map_err(|e| SynthesisError::FileSystem {
                path: target.clone(),
                operation: "read directory",
                source: e,
            })?;
            let mut files = Vec::new();
            for entry in entries {
                let path = entry?.path();
                if Self::is_supported_input(&path) && self.should_process_file(&path) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(invalid_parameter(
                "target",
                &target.display(),
                &"must be an image file or directory",
            ))
        }
    }

    /// Where the output for `input` is written
    pub fn output_path(&self, input: &Path, format: OutputFormat) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default();
        let output_name = format!(
            "{}{}.{}",
            stem.to_string_lossy(),
            OUTPUT_SUFFIX,
            format.extension()
        );

        match (&self.cli.output, input.parent()) {
            (Some(dir), _) => dir.join(output_name),
            (None, Some(parent)) => parent.join(output_name),
            (None, None) => PathBuf::from(output_name),
        }
    }

    fn is_supported_input(path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                INPUT_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            });
        let is_output = path
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().ends_with(OUTPUT_SUFFIX));
        path.is_file() && has_extension && !is_output
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        let format = self.cli.synthesis_config().format_for(self.cli.dry_run);
        let output_path = self.output_path(input_path, format);
        if output_path.exists() {
            info!(input = %input_path.display(), "skipping, output exists");
            false
        } else {
            true
        }
    }
}
