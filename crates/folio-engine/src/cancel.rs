//! # Session Cancellation
//!
//! A [`CancelToken`] is shared between the code running a phase and whoever
//! may stop it (Ctrl-C handler, closing dialog). Cancelling stops the next
//! item from starting. Nothing already written is undone.
//!
//! A request is consumed by the phase that stops on it: the workflow calls
//! [`CancelToken::clear`] afterwards, and every clone sees the cleared flag.

use std::time::Duration;
use tokio::sync::watch;

/// Cloneable cancellation flag backed by a `watch` channel.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: std::sync::Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        CancelToken::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        CancelToken {
            tx: std::sync::Arc::new(tx),
            rx,
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Withdraws a cancellation request.
    pub fn clear(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as any token clone, so this only ends on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleeps for `duration`. Returns `false` if cancelled first.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_cancel() {
        let token = CancelToken::new();
        assert!(token.sleep(Duration::from_millis(1000)).await);
        assert!(!token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let token = CancelToken::new();
        let remote = token.clone();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            remote.cancel();
        });

        let started = tokio::time::Instant::now();
        assert!(!token.sleep(Duration::from_secs(3600)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(token.is_cancelled());
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_seen_by_clones() {
        let token = CancelToken::new();
        let remote = token.clone();

        remote.cancel();
        assert!(token.is_cancelled());

        token.clear();
        assert!(!remote.is_cancelled());
        assert!(remote.sleep(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_sleep() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(!token.sleep(Duration::from_secs(3600)).await);
    }
}
