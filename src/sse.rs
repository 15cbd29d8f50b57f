//! Transport glue: feeding HTTP byte streams into a streaming session.
//!
//! Two ways to consume a stream:
//!
//! - [`drive`] pushes every outcome into the session's [`ResultSink`].
//! - [`decode_stream`] (and [`SseResponseExt`] for `reqwest::Response`)
//!   returns a pull-based `Stream` of events.
//!
//! Both stop reading as soon as the [`StreamControl`] is cancelled.

use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::control::StreamControl;
use crate::error::{BoxError, StreamError};
use crate::options::DecoderOptions;
use crate::session::StreamingSession;
use crate::sink::{QueueSink, ResultSink};

/// Extension trait for `reqwest::Response` to decode its body as a stream
/// of typed events.
///
/// # Example
/// ```ignore
/// use futures::StreamExt;
/// use openai_stream::control::StreamControl;
/// use openai_stream::sse::SseResponseExt;
///
/// let response = client.post(url).json(&body).send().await?;
///
/// let control = StreamControl::new();
/// let mut events = std::pin::pin!(response.decode_events::<ChatChunk>(control.clone()));
/// while let Some(result) = events.next().await {
///     let chunk = result?;
///     println!("Event: {:?}", chunk);
/// }
/// ```
pub trait SseResponseExt {
    /// Decode the body with default options.
    fn decode_events<T>(
        self,
        control: StreamControl,
    ) -> impl Stream<Item = Result<T, StreamError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Decode the body with explicit options.
    fn decode_events_with_options<T>(
        self,
        control: StreamControl,
        options: DecoderOptions,
    ) -> impl Stream<Item = Result<T, StreamError>> + Send
    where
        T: DeserializeOwned + Send;
}

impl SseResponseExt for reqwest::Response {
    fn decode_events<T>(
        self,
        control: StreamControl,
    ) -> impl Stream<Item = Result<T, StreamError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        self.decode_events_with_options(control, DecoderOptions::default())
    }

    fn decode_events_with_options<T>(
        self,
        control: StreamControl,
        options: DecoderOptions,
    ) -> impl Stream<Item = Result<T, StreamError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        decode_stream(self.bytes_stream(), control, options)
    }
}

/// What the transport produced next.
enum Delivery<B, E> {
    Chunk(B),
    Failed(E),
    Ended,
    Cancelled,
}

async fn next_delivery<St, B, E>(byte_stream: &mut St, control: &StreamControl) -> Delivery<B, E>
where
    St: Stream<Item = Result<B, E>> + Unpin,
{
    tokio::select! {
        biased;
        _ = control.cancelled() => Delivery::Cancelled,
        next = byte_stream.next() => match next {
            Some(Ok(chunk)) => Delivery::Chunk(chunk),
            Some(Err(err)) => Delivery::Failed(err),
            None => Delivery::Ended,
        },
    }
}

fn apply<T, S, B, E>(
    session: &mut StreamingSession<T, S>,
    delivery: Delivery<B, E>,
) -> Result<(), StreamError>
where
    T: DeserializeOwned,
    S: ResultSink<T>,
    B: AsRef<[u8]>,
    E: Into<BoxError>,
{
    match delivery {
        Delivery::Chunk(chunk) => session.receive(chunk.as_ref()),
        Delivery::Failed(err) => session.complete(Some(StreamError::transport(err))),
        Delivery::Ended => session.complete(None),
        Delivery::Cancelled => session.cancel(),
    }
}

/// Pump a byte stream into `session` until it completes, fails, or is
/// cancelled through the session's control.
///
/// Returns `Err(SessionClosed)` if the session was already terminal.
pub async fn drive<T, S, St, B, E>(
    session: &mut StreamingSession<T, S>,
    byte_stream: St,
) -> Result<(), StreamError>
where
    T: DeserializeOwned,
    S: ResultSink<T>,
    St: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<BoxError>,
{
    if session.state().is_terminal() {
        return Err(StreamError::SessionClosed(session.state()));
    }

    let mut byte_stream = std::pin::pin!(byte_stream);

    while !session.state().is_terminal() {
        let delivery = next_delivery(&mut byte_stream, session.control()).await;
        apply(session, delivery)?;
    }

    Ok(())
}

/// Decode a byte stream into a `Stream` of events.
///
/// Server errors and decode failures are yielded as `Err` items and the
/// stream continues. A transport failure or cancellation is yielded as a
/// final `Err`, then the stream ends.
///
/// # Example
/// ```
/// use bytes::Bytes;
/// use futures::{stream, StreamExt};
/// use openai_stream::control::StreamControl;
/// use openai_stream::options::DecoderOptions;
/// use openai_stream::sse::decode_stream;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let chunks = vec![
///     Ok::<_, std::io::Error>(Bytes::from_static(b"data: {\"n\":1}\n\ndata: {\"n\"")),
///     Ok(Bytes::from_static(b":2}\n\ndata: [DONE]\n\n")),
/// ];
///
/// let events: Vec<serde_json::Value> = decode_stream(
///     stream::iter(chunks),
///     StreamControl::new(),
///     DecoderOptions::default(),
/// )
/// .map(|result| result.unwrap())
/// .collect()
/// .await;
///
/// assert_eq!(events, vec![serde_json::json!({"n": 1}), serde_json::json!({"n": 2})]);
/// # }
/// ```
pub fn decode_stream<T, St, B, E>(
    byte_stream: St,
    control: StreamControl,
    options: DecoderOptions,
) -> impl Stream<Item = Result<T, StreamError>> + Send
where
    T: DeserializeOwned + Send,
    St: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Into<BoxError> + Send,
{
    let session = StreamingSession::new(QueueSink::new(), control, options);

    stream::unfold(
        (Box::pin(byte_stream), session),
        |(mut byte_stream, mut session)| async move {
            loop {
                // Drain queued outcomes before reading more data
                if let Some(item) = session.sink_mut().pop() {
                    return Some((item, (byte_stream, session)));
                }

                if session.state().is_terminal() {
                    return None;
                }

                let control = session.control().clone();
                let delivery = next_delivery(&mut byte_stream, &control).await;
                if let Err(err) = apply(&mut session, delivery) {
                    return Some((Err(err), (byte_stream, session)));
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;
    use bytes::Bytes;
    use serde::Deserialize;
    use std::io;
    use tokio::sync::mpsc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Valid {
        valid: u32,
    }

    fn chunks(parts: &[&'static str]) -> Vec<Result<Bytes, io::Error>> {
        parts
            .iter()
            .copied()
            .map(|part| Ok(Bytes::from_static(part.as_bytes())))
            .collect()
    }

    #[tokio::test]
    async fn test_decode_stream_reassembles_split_frames() {
        let input = chunks(&[
            "data: {\"valid\":1}\n\ndata: {\"val",
            "id\":2}\n\n: keep-alive\n\ndata: {\"valid\"",
            ":3}\n\ndata: [DONE]\n\n",
        ]);

        let events: Vec<Valid> = decode_stream(
            stream::iter(input),
            StreamControl::new(),
            DecoderOptions::default(),
        )
        .map(|result| result.unwrap())
        .collect()
        .await;

        assert_eq!(
            events,
            vec![Valid { valid: 1 }, Valid { valid: 2 }, Valid { valid: 3 }]
        );
    }

    #[tokio::test]
    async fn test_decode_stream_reports_errors_and_continues() {
        let input = chunks(&[
            "data: {bad} data: {\"error\":{\"message\":\"slow down\",\"type\":\"rate_limit\"}}\n\n",
            "data: {\"valid\":5}\n\n",
        ]);

        let items: Vec<Result<Valid, StreamError>> = decode_stream(
            stream::iter(input),
            StreamControl::new(),
            DecoderOptions::default(),
        )
        .collect()
        .await;

        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Err(StreamError::MalformedFrame(_))));
        match &items[1] {
            Err(StreamError::ServerReported(envelope)) => {
                assert_eq!(envelope.error.message, "slow down")
            }
            other => panic!("unexpected item: {:?}", other),
        }
        assert!(matches!(items[2], Ok(Valid { valid: 5 })));
    }

    #[tokio::test]
    async fn test_decode_stream_ends_with_transport_error() {
        let input = vec![
            Ok(Bytes::from_static(b"data: {\"valid\":1}\n\ndata: {\"va")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"lid\":2}\n\n")),
        ];

        let items: Vec<Result<Valid, StreamError>> = decode_stream(
            stream::iter(input),
            StreamControl::new(),
            DecoderOptions::default(),
        )
        .collect()
        .await;

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok(Valid { valid: 1 })));
        assert!(matches!(items[1], Err(StreamError::Transport(_))));
    }

    #[tokio::test]
    async fn test_decode_stream_cancelled_before_start() {
        let control = StreamControl::new();
        control.cancel();

        let items: Vec<Result<Valid, StreamError>> = decode_stream(
            stream::iter(chunks(&["data: {\"valid\":1}\n\n"])),
            control,
            DecoderOptions::default(),
        )
        .collect()
        .await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(StreamError::Cancelled)));
    }

    #[tokio::test]
    async fn test_decode_stream_cancel_while_waiting() {
        let control = StreamControl::new();
        let input = stream::iter(chunks(&["data: {\"valid\":1}\n\n"])).chain(stream::pending());

        let mut events = std::pin::pin!(decode_stream::<Valid, _, _, _>(
            input,
            control.clone(),
            DecoderOptions::default(),
        ));

        assert!(matches!(events.next().await, Some(Ok(Valid { valid: 1 }))));

        control.cancel();
        assert!(matches!(events.next().await, Some(Err(StreamError::Cancelled))));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drive_into_channel_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Result<Valid, StreamError>>();
        let mut session =
            StreamingSession::new(ChannelSink::new(tx), StreamControl::new(), DecoderOptions::default());

        let input = chunks(&["data: {\"valid\":7}\n\ndata: {\"va", "lid\":8}\n\ndata: [DONE]\n\n"]);
        drive(&mut session, stream::iter(input)).await.unwrap();
        assert!(session.state().is_terminal());

        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            received.push(item.unwrap());
        }
        assert_eq!(received, vec![Valid { valid: 7 }, Valid { valid: 8 }]);
    }

    #[tokio::test]
    async fn test_drive_rejects_closed_session() {
        let mut session = StreamingSession::<Valid, _>::new(
            QueueSink::new(),
            StreamControl::new(),
            DecoderOptions::default(),
        );
        session.complete(None).unwrap();

        let result = drive(&mut session, stream::iter(chunks(&["data: {\"valid\":1}"]))).await;
        assert!(matches!(result, Err(StreamError::SessionClosed(_))));
        assert!(session.sink().is_empty());
    }
}
