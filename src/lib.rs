//! # openai-stream - Incremental decoder for OpenAI-style streaming responses
//!
//! Streaming endpoints answer with a long-lived HTTP body of `data:`-prefixed
//! JSON frames. The body arrives in chunks whose boundaries have nothing to do
//! with frame boundaries, so a frame may be split across chunks and a chunk
//! may carry many frames.
//!
//! ## Features
//! - Reassembles frames split at any byte offset, including inside UTF-8 sequences
//! - Skips SSE comments and the `[DONE]` sentinel
//! - Distinguishes server error envelopes from undecodable frames
//! - Push (sink) and pull (`Stream`) consumption, with cooperative cancellation
//! - Structured logging through `tracing`
//!
//! ## Architecture
//!
//! - **`StreamDecoder<T>`**: owns the carried partial frame and turns each chunk into `DecodeOutcome`s
//! - **`StreamingSession<T, S>`**: per-stream state machine driving a `ResultSink`
//! - **`StreamControl`**: cancellation handle shared with the transport
//! - **`sse`**: glue for byte streams and `reqwest::Response`
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use openai_stream::control::StreamControl;
//! use openai_stream::sse::SseResponseExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let response = reqwest::Client::new()
//!         .post("https://api.openai.com/v1/chat/completions")
//!         .bearer_auth("your-api-key")
//!         .json(&serde_json::json!({
//!             "model": "gpt-4o",
//!             "stream": true,
//!             "messages": [{"role": "user", "content": "Hello!"}],
//!         }))
//!         .send()
//!         .await?;
//!
//!     let control = StreamControl::new();
//!     let mut events = std::pin::pin!(response.decode_events::<serde_json::Value>(control));
//!
//!     while let Some(event) = events.next().await {
//!         println!("{:?}", event?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod control;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod model;
pub mod options;
pub mod session;
pub mod sink;
pub mod sse;

// Re-exports for convenience
pub use control::StreamControl;
pub use decoder::StreamDecoder;
pub use error::StreamError;
pub use model::{ApiError, ApiErrorResponse, DecodeOutcome};
pub use options::DecoderOptions;
pub use session::{SessionState, StreamingSession};
pub use sink::{ChannelSink, QueueSink, ResultSink};
pub use sse::{decode_stream, drive, SseResponseExt};
