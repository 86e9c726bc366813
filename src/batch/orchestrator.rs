//! Batch synthesis over an ordered collection of source images

use crate::batch::report::{BatchReport, ItemFailure, ItemResult};
use crate::batch::scheduler::{BatchProgress, group_count, process_batch};
use crate::io::configuration::{BatchConfig, FailurePolicy};
use crate::io::error::{Result, SynthesisError};
use crate::synthesis::backend::SynthesisBackend;
use crate::synthesis::options::TileOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs a synthesis backend over many sources with bounded concurrency
///
/// Peak surface memory is capped at `batch_size` concurrent syntheses.
#[derive(Debug)]
pub struct Orchestrator<B> {
    backend: Arc<B>,
    config: BatchConfig,
    cancel: CancellationToken,
}

impl<B: SynthesisBackend> Orchestrator<B> {
    /// Create an orchestrator owning `backend`
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for a zero batch size
    pub fn new(backend: B, config: BatchConfig) -> Result<Self> {
        Self::from_shared(Arc::new(backend), config)
    }

    /// Create an orchestrator over a shared backend
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for a zero batch size
    pub fn from_shared(backend: Arc<B>, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Fail the batch with [`SynthesisError::Cancelled`] once `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Backend items are dispatched to
    pub const fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Active batch configuration
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Synthesize every source with shared `options`
    ///
    /// Item failures are recorded per index. Under
    /// [`FailurePolicy::Abort`] the batch stops after the group containing
    /// the first failure.
    ///
    /// Cancellation always fails the whole call, whether the token is seen
    /// at a group boundary or by an item inside a group. Results of groups
    /// already finished are discarded with it.
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for bad options,
    /// [`SynthesisError::Cancelled`] once cancellation is observed,
    /// [`SynthesisError::BatchAborted`] under the abort policy, and
    /// [`SynthesisError::TaskFailed`] if an item task panics
    #[tracing::instrument(
        skip_all,
        fields(items = items.len(), batch_size = self.config.batch_size)
    )]
    pub async fn process<P>(
        &self,
        items: Vec<Vec<u8>>,
        options: TileOptions,
        on_progress: P,
    ) -> Result<BatchReport>
    where
        P: FnMut(BatchProgress),
    {
        options.validate()?;
        info!(
            groups = group_count(items.len(), self.config.batch_size),
            "starting batch"
        );

        let backend = Arc::clone(&self.backend);
        let policy = self.config.failure_policy;
        let results = process_batch(
            items,
            self.config.batch_size,
            &self.cancel,
            move |index, image| {
                let backend = Arc::clone(&backend);
                async move {
                    backend
                        .run(image, options)
                        .await
                        .map_err(|error| ItemFailure { index, error })
                }
            },
            on_progress,
            |index, result: &ItemResult| {
                let failure = result.as_ref().err()?;
                match (&failure.error, policy) {
                    (SynthesisError::Cancelled { stage }, _) => {
                        Some(SynthesisError::Cancelled { stage: *stage })
                    }
                    (_, FailurePolicy::Abort) => Some(SynthesisError::BatchAborted {
                        index,
                        reason: failure.error.to_string(),
                    }),
                    (_, FailurePolicy::Continue) => None,
                }
            },
        )
        .await?;

        let report = BatchReport::new(results);
        for failure in report.failures() {
            if failure.error.is_item_failure() {
                warn!(index = failure.index, error = %failure.error, "item failed");
            } else {
                error!(index = failure.index, error = %failure.error, "item lost to its backend");
            }
        }
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch finished"
        );
        Ok(report)
    }
}
