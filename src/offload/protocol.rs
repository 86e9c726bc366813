//! Request and response messages for offloaded synthesis
//!
//! One request yields exactly one response. The JSON form is
//! `{ "image": <base64>, "options": { cols, rows, scale, addNoise, dryRun } }`
//! in and `{ "success": true, "result": { .. } }` or
//! `{ "success": false, "error": "..", "kind": "decode" }` out. `kind` is
//! optional; without it a failure reads back as an opaque offloaded error.

use crate::io::error::{Result, SynthesisError, channel_error};
use crate::io::image::EncodedImage;
use crate::synthesis::options::TileOptions;
use serde::{Deserialize, Serialize};

/// Serde adapter storing byte buffers as standard base64 strings
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as a base64 string
    ///
    /// # Errors
    ///
    /// Propagates serializer failures
    pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    /// Deserialize bytes from a base64 string
    ///
    /// # Errors
    ///
    /// Fails if the input is not a string or not valid base64
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Synthesis request sent to a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffloadRequest {
    /// Raw source image bytes
    #[serde(with = "base64_bytes")]
    pub image: Vec<u8>,
    /// Grid and mode options
    pub options: TileOptions,
}

/// Error category carried by a failure response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Source bytes were not a usable image
    Decode,
    /// Surface could not be serialized
    Encode,
    /// Requested dimensions exceeded a limit
    SizeConstraint,
    /// Options failed validation
    InvalidParameter,
    /// Message or channel failure inside the worker
    Channel,
    /// Worker observed cancellation
    Cancelled,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Category of `error`
    pub const fn of(error: &SynthesisError) -> Self {
        match error {
            SynthesisError::Decode { .. } => Self::Decode,
            SynthesisError::Encode { .. } => Self::Encode,
            SynthesisError::SizeConstraintExceeded { .. } => Self::SizeConstraint,
            SynthesisError::InvalidParameter { .. } => Self::InvalidParameter,
            SynthesisError::Channel { .. } => Self::Channel,
            SynthesisError::Cancelled { .. } => Self::Cancelled,
            _ => Self::Other,
        }
    }

    /// Rebuild an error of this kind from its wire message
    ///
    /// Decode, channel and cancellation failures come back as their own
    /// variants. The others carry structured fields that do not cross the
    /// wire and come back as [`SynthesisError::Offloaded`].
    pub fn rebuild(self, reason: String) -> SynthesisError {
        match self {
            Self::Decode => SynthesisError::Decode {
                reason,
                source: None,
            },
            Self::Channel => SynthesisError::Channel { reason },
            Self::Cancelled => SynthesisError::Cancelled {
                stage: "offloaded synthesis",
            },
            Self::Encode | Self::SizeConstraint | Self::InvalidParameter | Self::Other => {
                SynthesisError::Offloaded { reason }
            }
        }
    }
}

/// Message for `error` without the prefix its variant adds on rebuild
fn wire_reason(error: &SynthesisError) -> String {
    match error {
        SynthesisError::Decode {
            reason,
            source: Some(source),
        } => format!("{reason}: {source}"),
        SynthesisError::Decode {
            reason,
            source: None,
        }
        | SynthesisError::Channel { reason } => reason.clone(),
        _ => error.to_string(),
    }
}

/// Single reply to an [`OffloadRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadResponse {
    /// Whether synthesis succeeded
    pub success: bool,
    /// Encoded output when `success` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EncodedImage>,
    /// Failure message when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure category when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl OffloadResponse {
    /// Successful response carrying `image`
    pub const fn ok(image: EncodedImage) -> Self {
        Self {
            success: true,
            result: Some(image),
            error: None,
            kind: None,
        }
    }

    /// Uncategorized failure response carrying `message`
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
            kind: None,
        }
    }

    /// Failure response carrying the message and category of `error`
    pub fn from_error(error: &SynthesisError) -> Self {
        Self {
            kind: Some(FailureKind::of(error)),
            ..Self::failed(wire_reason(error))
        }
    }

    /// Build a response from a synthesis outcome
    pub fn from_result(outcome: Result<EncodedImage>) -> Self {
        match outcome {
            Ok(image) => Self::ok(image),
            Err(e) => Self::from_error(&e),
        }
    }

    /// Recover the synthesis outcome carried by the response
    ///
    /// # Errors
    ///
    /// Returns the error rebuilt by [`FailureKind::rebuild`] for failure
    /// responses, [`SynthesisError::Offloaded`] when no kind was sent, and
    /// [`SynthesisError::Channel`] if the fields contradict `success`
    pub fn into_result(self) -> Result<EncodedImage> {
        let Self {
            success,
            result,
            error,
            kind,
        } = self;
        match (success, result, error) {
            (true, Some(image), None) => Ok(image),
            (false, None, Some(reason)) => Err(match kind {
                Some(kind) => kind.rebuild(reason),
                None => SynthesisError::Offloaded { reason },
            }),
            (flag, image, message) => Err(channel_error(&format!(
                "malformed response (success={flag}, result={}, error={})",
                image.is_some(),
                message.is_some()
            ))),
        }
    }
}

/// Parse a JSON request
///
/// # Errors
///
/// Returns [`SynthesisError::Channel`] if the message is not a valid request
pub fn parse_request(message: &str) -> Result<OffloadRequest> {
    serde_json::from_str(message).map_err(|e| channel_error(&format!("malformed request: {e}")))
}

/// Parse a JSON response
///
/// # Errors
///
/// Returns [`SynthesisError::Channel`] if the message is not a valid response
pub fn parse_response(message: &str) -> Result<OffloadResponse> {
    serde_json::from_str(message).map_err(|e| channel_error(&format!("malformed response: {e}")))
}

/// Serialize any protocol message to JSON
///
/// # Errors
///
/// Returns [`SynthesisError::Channel`] if serialization fails
pub fn to_json<T: Serialize>(message: &T) -> Result<String> {
    serde_json::to_string(message).map_err(|e| channel_error(&format!("unserializable message: {e}")))
}
