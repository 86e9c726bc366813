/// Command-line parsing and file batch processing
pub mod cli;
/// Limits, defaults and runtime configuration
pub mod configuration;
/// Error types and result alias
pub mod error;
/// Source decoding and surface encoding
pub mod image;
/// Terminal progress display
pub mod progress;
