//! SSE frame splitting and classification.
//!
//! The wire format consumed here is the loose `data:`-delimited framing used
//! by OpenAI-style streaming endpoints:
//! ```text
//! data: {"key": "value"}
//!
//! : keep-alive
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```
//!
//! Frames are found by splitting on the `data:` marker rather than on line
//! boundaries, so a chunk may carry any number of frames in any layout.

/// Marker that introduces every frame.
pub const DATA_MARKER: &str = "data:";

/// Frames starting with this prefix are SSE comments.
pub const COMMENT_PREFIX: char = ':';

/// Default end-of-stream sentinel.
pub const DONE_MARKER: &str = "[DONE]";

/// Sub-marker for a comment appended after a data line inside one frame.
pub const COMMENT_TRAILER: &str = "\n\n:";

/// A candidate frame after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// SSE comment, discarded.
    Comment,
    /// End-of-stream sentinel, discarded.
    Done,
    /// JSON candidate text with any trailing comment fragment removed.
    Data(&'a str),
}

/// Split text into candidate frames.
///
/// Leading whitespace is stripped and blank segments are dropped. Trailing
/// whitespace is kept, since it may belong to a JSON string that continues
/// in the next chunk. Text before the first marker is a candidate too, so
/// the continuation of a frame whose marker arrived in an earlier chunk is
/// still found.
///
/// # Example
/// ```
/// use openai_stream::frame::split_frames;
///
/// let frames = split_frames("data: {\"a\":1}\n\ndata: [DONE]\n\n");
/// assert_eq!(frames, vec!["{\"a\":1}\n\n", "[DONE]\n\n"]);
/// ```
pub fn split_frames(text: &str) -> Vec<&str> {
    text.split(DATA_MARKER)
        .map(str::trim_start)
        .filter(|segment| !segment.trim_end().is_empty())
        .collect()
}

/// Classify a frame against the given completion marker.
///
/// # Example
/// ```
/// use openai_stream::frame::{classify, Frame, DONE_MARKER};
///
/// assert_eq!(classify(": ping", DONE_MARKER), Frame::Comment);
/// assert_eq!(classify("[DONE]", DONE_MARKER), Frame::Done);
/// assert_eq!(classify("{}\n\n: ping", DONE_MARKER), Frame::Data("{}"));
/// ```
pub fn classify<'a>(frame: &'a str, completion_marker: &str) -> Frame<'a> {
    let frame = frame.trim();

    if frame.starts_with(COMMENT_PREFIX) {
        return Frame::Comment;
    }

    if is_done_marker(frame, completion_marker) {
        return Frame::Done;
    }

    Frame::Data(strip_trailer(frame).trim())
}

/// The part of a frame before any appended comment.
fn strip_trailer(frame: &str) -> &str {
    frame.split(COMMENT_TRAILER).next().unwrap_or(frame)
}

/// Check if a frame is the end-of-stream sentinel.
///
/// # Example
/// ```
/// use openai_stream::frame::{is_done_marker, DONE_MARKER};
///
/// assert!(is_done_marker("[DONE]", DONE_MARKER));
/// assert!(!is_done_marker("", DONE_MARKER));
/// assert!(!is_done_marker("{\"data\": \"value\"}", DONE_MARKER));
/// ```
pub fn is_done_marker(frame: &str, completion_marker: &str) -> bool {
    frame == completion_marker
}

/// Re-arm a raw frame as a marker-prefixed fragment for the next chunk.
///
/// Trailing whitespace is kept so a frame cut inside a JSON string
/// reassembles byte for byte.
pub(crate) fn rearm(frame: &str) -> String {
    format!("{DATA_MARKER} {}", strip_trailer(frame))
}
