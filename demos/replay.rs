//! Replay a recorded chat completion stream through the decoder.
//!
//! The transcript is cut into uneven chunks to show frames being
//! reassembled across chunk boundaries.
//!
//! Run with:
//! ```bash
//! RUST_LOG=openai_stream=trace cargo run --example replay
//! ```

use bytes::Bytes;
use futures::{stream, StreamExt};
use openai_stream::control::StreamControl;
use openai_stream::options::DecoderOptions;
use openai_stream::sse::decode_stream;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const TRANSCRIPT: &str = concat!(
    ": OPENROUTER PROCESSING\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Ferris\"}}]}\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" is a crab\"}}]}\n\n",
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" \u{1f980}\"},\"finish_reason\":\"stop\"}]}\n\n",
    "data: [DONE]\n\n",
);

const CHUNK_SIZES: [usize; 6] = [31, 64, 5, 91, 33, 128];

#[derive(Debug, Deserialize)]
struct ChatChunk {
    id: String,
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

fn chunked(transcript: &'static [u8]) -> Vec<Result<Bytes, std::io::Error>> {
    let mut chunks = Vec::new();
    let mut offset = 0;

    for size in CHUNK_SIZES.iter().cycle() {
        if offset >= transcript.len() {
            break;
        }
        let end = (offset + size).min(transcript.len());
        chunks.push(Ok(Bytes::from_static(&transcript[offset..end])));
        offset = end;
    }

    chunks
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let chunks = chunked(TRANSCRIPT.as_bytes());
    println!("Replaying {} chunks...\n", chunks.len());

    let options = DecoderOptions::new().with_log_payloads(true);
    let mut events = std::pin::pin!(decode_stream::<ChatChunk, _, _, _>(
        stream::iter(chunks),
        StreamControl::new(),
        options,
    ));

    print!("Response: ");
    while let Some(result) = events.next().await {
        let chunk = result?;
        for choice in &chunk.choices {
            if let Some(content) = &choice.delta.content {
                print!("{}", content);
            }
            if let Some(reason) = &choice.finish_reason {
                println!("\n\n=== Stream Complete ({}) ===", chunk.id);
                println!("Finish reason: {}", reason);
            }
        }
    }

    Ok(())
}
