//! Incremental decoder turning raw chunks into typed outcomes.
//!
//! Chunks arrive with arbitrary boundaries. Each call to
//! [`StreamDecoder::ingest`] drains the carried partial frame plus the new
//! chunk into zero or more complete frames and at most one leftover
//! fragment. Only the last frame of a batch may be kept back; every earlier
//! frame is assumed complete, so its decode failure is reported.

use itertools::{Itertools, Position};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::str::Utf8Error;
use tracing::{debug, trace};

use crate::error::StreamError;
use crate::frame::{classify, rearm, split_frames, Frame};
use crate::model::{ApiErrorResponse, DecodeOutcome};
use crate::options::DecoderOptions;

/// Stateful decoder for one stream of `T` events.
///
/// A decoder is created per stream and dropped (or [`finish`](Self::finish)ed)
/// when the stream ends. It is never shared between streams.
#[derive(Debug)]
pub struct StreamDecoder<T> {
    options: DecoderOptions,
    pending: String,
    utf8_tail: Vec<u8>,
    _event: PhantomData<fn() -> T>,
}

impl<T> Default for StreamDecoder<T> {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl<T> StreamDecoder<T> {
    /// Create a decoder with the given options.
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            pending: String::new(),
            utf8_tail: Vec::new(),
            _event: PhantomData,
        }
    }

    /// Options this decoder was created with.
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// The carried partial frame, or `""`.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Consume the decoder, returning the dangling fragment that is dropped.
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }

        debug!(
            pending.len = self.pending.len(),
            "discarding dangling fragment at end of stream"
        );
        Some(self.pending)
    }

    /// Decode chunk bytes as UTF-8, carrying an incomplete trailing
    /// sequence over to the next chunk.
    fn decode_text<'b>(&mut self, bytes: &'b [u8]) -> Result<&'b str, Utf8Error> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(err) if err.error_len().is_none() => {
                let (valid, tail) = bytes.split_at(err.valid_up_to());
                self.utf8_tail = tail.to_vec();
                std::str::from_utf8(valid)
            }
            Err(err) => Err(err),
        }
    }

    fn payload<'f>(&self, frame: &'f str) -> &'f str {
        if self.options.log_payloads {
            frame
        } else {
            "<redacted>"
        }
    }
}

impl<T: DeserializeOwned> StreamDecoder<T> {
    /// Feed one raw chunk, returning the outcomes it completes, in order.
    ///
    /// # Example
    /// ```
    /// use openai_stream::decoder::StreamDecoder;
    /// use openai_stream::model::DecodeOutcome;
    ///
    /// let mut decoder = StreamDecoder::<serde_json::Value>::default();
    ///
    /// assert!(decoder.ingest(b"data: {\"n\":").is_empty());
    /// let outcomes = decoder.ingest(b"1}\n\ndata: [DONE]\n\n");
    ///
    /// assert!(matches!(&outcomes[..], [DecodeOutcome::Event(v)] if v["n"] == 1));
    /// ```
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<DecodeOutcome<T>> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let bytes: Cow<'_, [u8]> = if self.utf8_tail.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.utf8_tail);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        let text = match self.decode_text(&bytes) {
            Ok(text) => text,
            Err(err) => {
                debug!(chunk.len = chunk.len(), error = %err, "unreadable chunk");
                return vec![DecodeOutcome::Failure(StreamError::UnreadableChunk(err))];
            }
        };

        self.ingest_str(text)
    }

    /// Feed one chunk that is already text.
    pub fn ingest_str(&mut self, chunk: &str) -> Vec<DecodeOutcome<T>> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let buffer = std::mem::take(&mut self.pending) + chunk;
        self.decode_frames(&buffer)
    }

    fn decode_frames(&mut self, buffer: &str) -> Vec<DecodeOutcome<T>> {
        let frames = split_frames(buffer);
        let count = frames.len();
        let mut outcomes = Vec::with_capacity(count);

        for (index, (position, frame)) in frames.into_iter().with_position().enumerate() {
            let json = match classify(frame, &self.options.completion_marker) {
                Frame::Comment => {
                    trace!(frame.index = index, frame.count = count, "skipping SSE comment");
                    continue;
                }
                Frame::Done => {
                    trace!(frame.index = index, frame.count = count, "completion marker");
                    continue;
                }
                Frame::Data(json) => json,
            };

            let err = match serde_json::from_str::<T>(json) {
                Ok(event) => {
                    outcomes.push(DecodeOutcome::Event(event));
                    continue;
                }
                Err(err) => err,
            };

            if let Ok(envelope) = serde_json::from_str::<ApiErrorResponse>(json) {
                debug!(frame.index = index, error = %envelope, "server reported error");
                outcomes.push(DecodeOutcome::ServerError(envelope));
            } else if matches!(position, Position::Last | Position::Only) {
                trace!(
                    frame.index = index,
                    frame.count = count,
                    frame.len = frame.len(),
                    payload = self.payload(frame),
                    "buffering partial frame"
                );
                self.pending = rearm(frame);
            } else {
                debug!(
                    frame.index = index,
                    frame.count = count,
                    payload = self.payload(json),
                    error = %err,
                    "malformed frame"
                );
                outcomes.push(DecodeOutcome::Failure(StreamError::MalformedFrame(err)));
            }
        }

        outcomes
    }
}
