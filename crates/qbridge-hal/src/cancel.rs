//! Cooperative cancellation for the two suspension points (connect, remote execute).

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable cancellation flag.
///
/// All clones observe the same flag. Cancelling is idempotent and cannot be
/// undone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create an un-cancelled token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|&cancelled| cancelled).await.is_err() {
            // The sender lives in `self`, so this branch cannot be reached
            // while the future is alive.
            std::future::pending::<()>().await;
        }
    }
}
