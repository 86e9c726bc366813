//! Error types shared by synthesis, batching and offload operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all synthesis operations
#[derive(Debug)]
pub enum SynthesisError {
    /// Input bytes could not be interpreted as a usable image
    Decode {
        /// Description of what went wrong while decoding
        reason: String,
        /// Underlying decoder error, when the decoder produced one
        source: Option<image::ImageError>,
    },

    /// Destination surface could not be serialized
    Encode {
        /// Name of the requested output format
        format: &'static str,
        /// Underlying encoder error
        source: image::ImageError,
    },

    /// Requested dimensions exceed what a surface may hold
    ///
    /// Raised for tiles only in strict size mode; the default policy clamps
    /// the tile instead. A destination above the surface pixel limit is
    /// always rejected before it is allocated.
    SizeConstraintExceeded {
        /// Axis that exceeded the limit
        axis: &'static str,
        /// Requested extent along the axis
        requested: f64,
        /// Maximum permitted extent along the axis
        limit: f64,
    },

    /// Offload message was malformed or the channel closed early
    Channel {
        /// Description of the channel failure
        reason: String,
    },

    /// Offloaded synthesis ran but reported a failure
    Offloaded {
        /// Error message produced inside the worker
        reason: String,
    },

    /// Option or configuration validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Work stopped at a cancellation point
    Cancelled {
        /// Stage that observed the cancellation
        stage: &'static str,
    },

    /// A batch task terminated without producing a result
    TaskFailed {
        /// Input index of the item whose task failed
        index: usize,
        /// Description of the task failure
        reason: String,
    },

    /// Batch stopped early under the abort-on-failure policy
    BatchAborted {
        /// Input index of the first failed item
        index: usize,
        /// Message of the failure that stopped the batch
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl SynthesisError {
    /// Whether this error stems from the item itself rather than the batch machinery
    pub const fn is_item_failure(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::Encode { .. }
                | Self::SizeConstraintExceeded { .. }
                | Self::Offloaded { .. }
                | Self::InvalidParameter { .. }
        )
    }
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode {
                reason,
                source: Some(source),
            } => write!(f, "Failed to decode source image: {reason}: {source}"),
            Self::Decode {
                reason,
                source: None,
            } => write!(f, "Failed to decode source image: {reason}"),
            Self::Encode { format, source } => {
                write!(f, "Failed to encode surface as {format}: {source}")
            }
            Self::SizeConstraintExceeded {
                axis,
                requested,
                limit,
            } => {
                write!(
                    f,
                    "Surface {axis} of {requested:.1}px exceeds the limit of {limit:.1}px"
                )
            }
            Self::Channel { reason } => write!(f, "Offload channel error: {reason}"),
            Self::Offloaded { reason } => write!(f, "Offloaded synthesis failed: {reason}"),
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::Cancelled { stage } => write!(f, "Cancelled during {stage}"),
            Self::TaskFailed { index, reason } => {
                write!(f, "Task for item {index} failed: {reason}")
            }
            Self::BatchAborted { index, reason } => {
                write!(f, "Batch aborted at item {index}: {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode {
                source: Some(source),
                ..
            }
            | Self::Encode { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for synthesis results
pub type Result<T> = std::result::Result<T, SynthesisError>;

impl From<std::io::Error> for SynthesisError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> SynthesisError {
    SynthesisError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an offload channel error
pub fn channel_error(reason: &impl ToString) -> SynthesisError {
    SynthesisError::Channel {
        reason: reason.to_string(),
    }
}

/// Create a decode error that has no underlying decoder error
pub fn decode_error(reason: &impl ToString) -> SynthesisError {
    SynthesisError::Decode {
        reason: reason.to_string(),
        source: None,
    }
}
