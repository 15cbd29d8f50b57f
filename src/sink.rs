//! Receivers for decode outcomes and the terminal completion notice.

use std::collections::VecDeque;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::StreamError;
use crate::model::DecodeOutcome;

/// Consumer driven by a [`StreamingSession`](crate::session::StreamingSession).
///
/// `on_outcome` is called for each outcome in arrival order. `on_complete`
/// is called exactly once, after the last outcome.
pub trait ResultSink<T> {
    fn on_outcome(&mut self, outcome: DecodeOutcome<T>);

    fn on_complete(&mut self, error: Option<StreamError>);
}

/// Forwards outcomes into an unbounded channel.
///
/// Server errors and decode failures are sent as `Err` items. A terminal
/// error is sent as a final `Err`, after which the sender is dropped so the
/// receiver observes the end of the stream. A closed receiver is ignored.
#[derive(Debug)]
pub struct ChannelSink<T> {
    tx: Option<UnboundedSender<Result<T, StreamError>>>,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: UnboundedSender<Result<T, StreamError>>) -> Self {
        Self { tx: Some(tx) }
    }

    fn send(&self, item: Result<T, StreamError>) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more.
            let _ = tx.send(item);
        }
    }
}

impl<T> ResultSink<T> for ChannelSink<T> {
    fn on_outcome(&mut self, outcome: DecodeOutcome<T>) {
        self.send(outcome.into_result());
    }

    fn on_complete(&mut self, error: Option<StreamError>) {
        if let Some(err) = error {
            self.send(Err(err));
        }
        self.tx = None;
    }
}

/// In-memory FIFO of outcomes, drained with [`pop`](Self::pop).
#[derive(Debug)]
pub struct QueueSink<T> {
    queue: VecDeque<Result<T, StreamError>>,
    finished: bool,
}

impl<T> Default for QueueSink<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            finished: false,
        }
    }
}

impl<T> QueueSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<Result<T, StreamError>> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether the completion notice has been received.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T> ResultSink<T> for QueueSink<T> {
    fn on_outcome(&mut self, outcome: DecodeOutcome<T>) {
        self.queue.push_back(outcome.into_result());
    }

    fn on_complete(&mut self, error: Option<StreamError>) {
        if let Some(err) = error {
            self.queue.push_back(Err(err));
        }
        self.finished = true;
    }
}
