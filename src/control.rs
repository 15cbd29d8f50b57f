//! Cancellation capability shared between a session and its transport.

use tokio_util::sync::CancellationToken;

/// Handle used to stop a stream.
///
/// Clones share one cancellation state. The consumer keeps a clone and the
/// transport watches another; cancelling any clone stops chunk delivery.
///
/// # Example
/// ```rust
/// use openai_stream::control::StreamControl;
///
/// let control = StreamControl::new();
/// let transport_side = control.clone();
///
/// control.cancel();
/// assert!(transport_side.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamControl {
    token: CancellationToken,
}

impl StreamControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_idempotent() {
        let control = StreamControl::new();
        assert!(!control.is_cancelled());
        control.cancel();
        control.cancel();
        assert!(control.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let control = StreamControl::new();
        let waiter = control.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        control.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}
