//! Per-stream state machine connecting a transport to a result sink.
//!
//! ```text
//! Idle --receive--> Streaming --receive--> Streaming
//!   |                   |
//!   +----complete-------+--> Completed
//!   +----cancel---------+--> Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. The sink receives its
//! completion notice exactly once, on entering either of them.

use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, warn};

use crate::control::StreamControl;
use crate::decoder::StreamDecoder;
use crate::error::StreamError;
use crate::options::DecoderOptions;
use crate::sink::ResultSink;

/// Lifecycle state of a [`StreamingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no chunk received yet
    Idle,
    /// At least one chunk received
    Streaming,
    /// Transport signalled completion
    Completed,
    /// Cancelled through the control
    Cancelled,
}

impl SessionState {
    /// Whether no further operation is accepted.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Streaming => "streaming",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// One streaming response being decoded into `T` events.
///
/// The transport calls [`receive`](Self::receive) for each chunk, in arrival
/// order and never concurrently, then [`complete`](Self::complete) once.
/// Every outcome is handed to the sink before `receive` returns.
///
/// # Example
/// ```
/// use openai_stream::control::StreamControl;
/// use openai_stream::options::DecoderOptions;
/// use openai_stream::session::{SessionState, StreamingSession};
/// use openai_stream::sink::QueueSink;
///
/// let mut session = StreamingSession::<serde_json::Value, _>::new(
///     QueueSink::new(),
///     StreamControl::new(),
///     DecoderOptions::default(),
/// );
///
/// session.receive(b"data: {\"id\":1}\n\ndata: [DONE]\n\n")?;
/// session.complete(None)?;
///
/// assert_eq!(session.state(), SessionState::Completed);
/// assert_eq!(session.sink_mut().pop().unwrap()?["id"], 1);
/// # Ok::<(), openai_stream::StreamError>(())
/// ```
#[derive(Debug)]
pub struct StreamingSession<T, S> {
    decoder: Option<StreamDecoder<T>>,
    sink: S,
    control: StreamControl,
    state: SessionState,
}

impl<T, S> StreamingSession<T, S>
where
    T: DeserializeOwned,
    S: ResultSink<T>,
{
    pub fn new(sink: S, control: StreamControl, options: DecoderOptions) -> Self {
        Self {
            decoder: Some(StreamDecoder::new(options)),
            sink,
            control,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The cancellation handle watched by the transport.
    pub fn control(&self) -> &StreamControl {
        &self.control
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Decode one chunk and deliver its outcomes.
    ///
    /// If the control was cancelled since the previous chunk, the chunk is
    /// not decoded and the session is cancelled instead.
    pub fn receive(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.ensure_open("receive")?;

        if self.control.is_cancelled() {
            return self.cancel();
        }

        let Some(decoder) = self.decoder.as_mut() else {
            return Err(StreamError::SessionClosed(self.state));
        };

        if self.state == SessionState::Idle {
            debug!(from = %self.state, to = %SessionState::Streaming, "session state change");
            self.state = SessionState::Streaming;
        }

        for outcome in decoder.ingest(chunk) {
            self.sink.on_outcome(outcome);
        }

        Ok(())
    }

    /// End the stream with the transport's completion signal.
    ///
    /// A dangling partial frame is discarded without being reported.
    pub fn complete(&mut self, error: Option<StreamError>) -> Result<(), StreamError> {
        self.ensure_open("complete")?;
        self.finish(SessionState::Completed, error);
        Ok(())
    }

    /// Cancel the stream.
    ///
    /// Cancels the shared control so the transport stops delivering chunks.
    /// Outcomes already delivered stay delivered; the sink is then completed
    /// with [`StreamError::Cancelled`].
    pub fn cancel(&mut self) -> Result<(), StreamError> {
        self.ensure_open("cancel")?;
        self.control.cancel();
        self.finish(SessionState::Cancelled, Some(StreamError::Cancelled));
        Ok(())
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), StreamError> {
        if self.state.is_terminal() {
            warn!(operation, state = %self.state, "operation on closed session");
            return Err(StreamError::SessionClosed(self.state));
        }
        Ok(())
    }

    fn finish(&mut self, state: SessionState, error: Option<StreamError>) {
        if let Some(decoder) = self.decoder.take() {
            // A dangling fragment is not reported.
            let _ = decoder.finish();
        }

        debug!(from = %self.state, to = %state, error = ?error, "session state change");
        self.state = state;
        self.sink.on_complete(error);
    }
}
