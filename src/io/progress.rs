//! Terminal progress display driven by batch progress callbacks

use crate::batch::report::BatchReport;
use crate::batch::scheduler::BatchProgress;
use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] Images: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Single progress bar tracking completed images
pub struct ProgressManager {
    bar: Option<ProgressBar>,
    last: Option<BatchProgress>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a manager with no bar shown yet
    pub const fn new() -> Self {
        Self {
            bar: None,
            last: None,
        }
    }

    /// Show a bar for `total` images
    pub fn initialize(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(BATCH_STYLE.clone());
        self.bar = Some(bar);
        self.last = None;
    }

    /// Apply a progress callback value
    ///
    /// Values never move the bar backwards.
    pub fn update(&mut self, progress: BatchProgress) {
        if self
            .last
            .is_some_and(|last| last.completed > progress.completed)
        {
            return;
        }
        if let Some(ref bar) = self.bar {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.completed as u64);
        }
        self.last = Some(progress);
    }

    /// Most recent progress applied
    pub const fn last(&self) -> Option<BatchProgress> {
        self.last
    }

    /// Close the bar with a success/failure summary
    pub fn finish(&self, report: &BatchReport) {
        if let Some(ref bar) = self.bar {
            bar.finish_with_message(format!(
                "{} written, {} failed",
                report.succeeded(),
                report.failed()
            ));
        }
    }
}
