//! Error types for stream decoding.

use thiserror::Error;

use crate::model::ApiErrorResponse;
use crate::session::SessionState;

/// Boxed transport error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while decoding a stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Unreadable chunk: {0}")]
    UnreadableChunk(#[from] std::str::Utf8Error),

    #[error("Server error: {0}")]
    ServerReported(ApiErrorResponse),

    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("Stream cancelled")]
    Cancelled,

    #[error("Session already {0}")]
    SessionClosed(SessionState),
}

impl StreamError {
    /// Wrap any transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        StreamError::Transport(err.into())
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        StreamError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_transport_wraps_source() {
        let err = StreamError::transport(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(err.to_string(), "Transport error: reset");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_frame_errors_convert() {
        let parse = serde_json::from_str::<u32>("{").unwrap_err();
        assert!(matches!(StreamError::from(parse), StreamError::MalformedFrame(_)));

        let bytes = [0xff_u8];
        let utf8 = std::str::from_utf8(&bytes).unwrap_err();
        assert!(matches!(StreamError::from(utf8), StreamError::UnreadableChunk(_)));
    }

    #[test]
    fn test_session_closed_message() {
        let err = StreamError::SessionClosed(SessionState::Cancelled);
        assert_eq!(err.to_string(), "Session already cancelled");
    }
}
