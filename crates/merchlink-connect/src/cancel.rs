//! # Cancellation Signals
//!
//! A small cancellation primitive built on `tokio::sync::watch`.
//!
//! The embedding application holds a [`CancelHandle`] and passes the paired
//! [`CancelToken`] into connector operations. Cancellation is cooperative:
//! the retry executor checks the token between attempts, and dispatch races
//! it against the in-flight request. A cancelled call is terminal - it is
//! not retried and its result is never cached.

use std::sync::OnceLock;

use tokio::sync::watch;

use merchlink_core::{ConnectorError, ConnectorResult};

/// The sender half: cancels every operation holding the paired token.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Creates another token observing this handle.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// The receiver half: observed by connector operations.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a handle/token pair.
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelToken { rx })
    }

    /// A token that is never cancelled.
    pub fn never() -> CancelToken {
        // One shared sender keeps the channel open for the process lifetime;
        // every `never()` token is a subscriber of it.
        static NEVER: OnceLock<watch::Sender<bool>> = OnceLock::new();
        let tx = NEVER.get_or_init(|| watch::channel(false).0);
        CancelToken {
            rx: tx.subscribe(),
        }
    }

    /// Returns true if cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Fails with the cancellation outcome if already cancelled.
    pub fn check(&self) -> ConnectorResult<()> {
        if self.is_cancelled() {
            Err(ConnectorError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when cancellation is signalled.
    ///
    /// If the handle was dropped without cancelling, this pends forever -
    /// an operation whose owner went away cannot be cancelled anymore.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_cancels() {
        let (handle, token) = CancelToken::pair();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ConnectorError::Cancelled)));
    }

    #[test]
    fn test_never_token() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_signal() {
        let (handle, mut token) = CancelToken::pair();
        handle.cancel();
        // Must resolve immediately once signalled.
        token.cancelled().await;
    }
}
