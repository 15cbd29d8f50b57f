//! Decode outcomes and the server error envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StreamError;

/// Result of decoding one frame (or one unreadable chunk).
#[derive(Debug)]
pub enum DecodeOutcome<T> {
    /// The frame decoded as the expected event type.
    Event(T),

    /// The frame decoded as the server's error envelope.
    ServerError(ApiErrorResponse),

    /// The frame or chunk could not be decoded.
    Failure(StreamError),
}

impl<T> DecodeOutcome<T> {
    /// Collapse into a `Result`, turning a server error into
    /// [`StreamError::ServerReported`].
    pub fn into_result(self) -> Result<T, StreamError> {
        match self {
            DecodeOutcome::Event(event) => Ok(event),
            DecodeOutcome::ServerError(envelope) => Err(StreamError::ServerReported(envelope)),
            DecodeOutcome::Failure(err) => Err(err),
        }
    }
}

/// Error envelope sent by OpenAI-compatible servers in place of an event.
///
/// ```json
/// {"error": {"message": "Rate limit reached", "type": "requests", "param": null, "code": "rate_limit_exceeded"}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Body of an [`ApiErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,

    #[serde(rename = "type")]
    pub error_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error.error_type, self.error.message)
    }
}
