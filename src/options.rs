//! Decoder configuration.

use crate::frame::DONE_MARKER;

/// Options controlling how a stream is decoded.
///
/// # Example
/// ```rust
/// use openai_stream::options::DecoderOptions;
///
/// let options = DecoderOptions::new()
///     .with_completion_marker("[END]".to_string())
///     .with_log_payloads(true);
///
/// assert_eq!(options.completion_marker, "[END]");
/// assert!(options.log_payloads);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Frame value that marks the logical end of the stream
    pub completion_marker: String,

    /// Include frame text in trace events
    pub log_payloads: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            completion_marker: DONE_MARKER.to_string(),
            log_payloads: false,
        }
    }
}

impl DecoderOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the completion marker.
    pub fn with_completion_marker(mut self, marker: String) -> Self {
        self.completion_marker = marker;
        self
    }

    /// Enable or disable frame text in trace events.
    pub fn with_log_payloads(mut self, log_payloads: bool) -> Self {
        self.log_payloads = log_payloads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DecoderOptions::default();
        assert_eq!(options.completion_marker, "[DONE]");
        assert!(!options.log_payloads);
        assert_eq!(options, DecoderOptions::new());
    }
}
