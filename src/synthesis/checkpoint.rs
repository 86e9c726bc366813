//! Cooperative suspension and cancellation points

use crate::io::error::{Result, SynthesisError};
use tokio_util::sync::CancellationToken;

/// Fail fast if cancellation has been requested
///
/// Called before committing a unit of work, never in the middle of one.
///
/// # Errors
///
/// Returns [`SynthesisError::Cancelled`] naming `stage` once the token fires
pub fn ensure_active(cancel: &CancellationToken, stage: &'static str) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(SynthesisError::Cancelled { stage });
    }
    Ok(())
}

/// Hand control back to the scheduler once
pub async fn yield_point() {
    tokio::task::yield_now().await;
}
