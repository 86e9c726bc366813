//! Grouped execution of asynchronous work with ordered results
//!
//! Items are split into consecutive groups of at most `batch_size`. A
//! group is submitted together and awaited together; progress is reported
//! and control yielded once between groups. Results are placed by input
//! index, so completion order inside a group never affects output order.

use crate::io::error::{Result, SynthesisError, invalid_parameter};
use crate::synthesis::checkpoint::{ensure_active, yield_point};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Completed-of-total snapshot handed to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Items finished so far, successful or not
    pub completed: usize,
    /// Items in the batch
    pub total: usize,
}

impl BatchProgress {
    /// Completed share in 0.0..=1.0; an empty batch counts as complete
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Whether every item has finished
    pub const fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Completion counter shared by concurrently running items
#[derive(Debug, Default)]
pub struct ProgressCounter {
    completed: AtomicUsize,
}

impl ProgressCounter {
    /// Record one finished item and return the new count
    pub fn record(&self) -> usize {
        self.completed.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Items recorded so far
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

/// Number of groups `total` items form at `batch_size`
pub const fn group_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        0
    } else {
        total.div_ceil(batch_size)
    }
}

/// Run `processor` over `items` in groups of at most `batch_size`
///
/// `processor` receives each item with its input index. After every group,
/// `on_progress` sees the completed count, then `halt` may stop the batch
/// by returning an error for a result of that group. Cancellation is
/// checked before each group starts.
///
/// # Errors
///
/// Returns an invalid parameter error for a zero batch size,
/// [`SynthesisError::Cancelled`] if the token fires at a group boundary,
/// [`SynthesisError::TaskFailed`] if a task panics, or the error produced
/// by `halt`
pub async fn process_batch<T, R, F, Fut, P, H>(
    items: Vec<T>,
    batch_size: usize,
    cancel: &CancellationToken,
    processor: F,
    mut on_progress: P,
    halt: H,
) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    P: FnMut(BatchProgress),
    H: Fn(usize, &R) -> Option<SynthesisError>,
{
    if batch_size == 0 {
        return Err(invalid_parameter(
            "batch_size",
            &batch_size,
            &"must be at least 1",
        ));
    }

    let total = items.len();
    let counter = Arc::new(ProgressCounter::default());
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut pending = items.into_iter().enumerate().peekable();
    let mut group = 0usize;

    while pending.peek().is_some() {
        ensure_active(cancel, "batch scheduling")?;

        let mut tasks = JoinSet::new();
        let mut members = Vec::with_capacity(batch_size);
        for (index, item) in pending.by_ref().take(batch_size) {
            let work = processor(index, item);
            let counter = Arc::clone(&counter);
            members.push(index);
            tasks.spawn(async move {
                let output = work.await;
                counter.record();
                (index, output)
            });
        }

        let mut task_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, output)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(output);
                    }
                }
                Err(e) => {
                    task_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(reason) = task_error {
            let index = members
                .iter()
                .copied()
                .find(|&index| slots.get(index).is_some_and(Option::is_none))
                .unwrap_or_default();
            return Err(SynthesisError::TaskFailed { index, reason });
        }

        let progress = BatchProgress {
            completed: counter.completed(),
            total,
        };
        tracing::info!(
            group,
            completed = progress.completed,
            total,
            "batch group complete"
        );
        on_progress(progress);

        for &index in &members {
            if let Some(Some(output)) = slots.get(index)
                && let Some(error) = halt(index, output)
            {
                return Err(error);
            }
        }

        group += 1;
        yield_point().await;
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| SynthesisError::TaskFailed {
                index,
                reason: "no result recorded".to_string(),
            })
        })
        .collect()
}
