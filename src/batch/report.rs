//! Ordered per-item outcomes of a batch

use crate::io::error::SynthesisError;
use crate::io::image::EncodedImage;
use std::fmt;

/// Failure of one batch item, tagged with its input index
#[derive(Debug)]
pub struct ItemFailure {
    /// Position of the item in the input
    pub index: usize,
    /// Why the item failed
    pub error: SynthesisError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}: {}", self.index, self.error)
    }
}

impl std::error::Error for ItemFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Outcome of one batch item
pub type ItemResult = std::result::Result<EncodedImage, ItemFailure>;

/// Results of a batch in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<ItemResult>,
}

impl BatchReport {
    /// Wrap results already in input order
    pub const fn new(results: Vec<ItemResult>) -> Self {
        Self { results }
    }

    /// Results in input order
    pub fn results(&self) -> &[ItemResult] {
        &self.results
    }

    /// Take ownership of the results
    pub fn into_results(self) -> Vec<ItemResult> {
        self.results
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch had no items
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of successful items
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.is_ok()).count()
    }

    /// Number of failed items
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Failed items in input order
    pub fn failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.results.iter().filter_map(|result| result.as_ref().err())
    }

    /// Successful outputs with their input index
    pub fn outputs(&self) -> impl Iterator<Item = (usize, &EncodedImage)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.as_ref().ok().map(|image| (index, image)))
    }
}
