use crate::error::SplitchainError;
use std::future::Future;
use tokio::sync::watch;

/// Cancellation signal honoured at every await point of a batch.
///
/// Backed by a `watch` channel so a single sender (for example a daemon's
/// shutdown signal) can fan out to every in-flight batch.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Owning side of a [`CancelToken`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A fresh token together with the handle that fires it.
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelToken { rx })
    }

    /// A token that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn from_watch(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token fires. Pends forever if the sender is gone
    /// without having cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `fut` unless the token fires first.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, SplitchainError>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(SplitchainError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(SplitchainError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}
