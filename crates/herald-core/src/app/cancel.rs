//! Cancellation - 操作全体のキャンセルと期限
//!
//! WorkerGroup の shutdown と同じく `watch` チャネルで通知します。
//! `CancelSource` を持つ側が `cancel()` すると、その `CancelToken` を
//! 待っているすべてのタスクが起きます。期限（deadline）も同じトークンに載せられます。

use std::future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

/// The owning side of a cancellation signal.
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
            deadline: None,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        // receiver がいなくても値は残る
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observed by every stage of an operation.
///
/// Dropping the `CancelSource` without calling `cancel()` does not cancel.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that is never cancelled (no source, no deadline).
    pub fn never() -> Self {
        Self {
            rx: None,
            deadline: None,
        }
    }

    /// Also cancel at `deadline`. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        let signalled = self.rx.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        signalled || expired
    }

    /// Resolves once the token is cancelled or its deadline passes.
    /// Never resolves for [`CancelToken::never`].
    pub async fn cancelled(&self) {
        let deadline = async {
            match self.deadline {
                Some(at) => sleep_until(at).await,
                None => future::pending::<()>().await,
            }
        };

        let signal = async {
            let Some(rx) = &self.rx else {
                return future::pending::<()>().await;
            };
            let mut rx = rx.clone();
            // sender が cancel せずに drop された場合はキャンセル扱いにしない
            let changed = rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
            if changed.is_err() {
                future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = deadline => {}
            _ = signal => {}
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}
