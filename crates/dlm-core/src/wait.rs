//! Wait tokens: caller-supplied deadline and cancellation for lock calls.

use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use crate::error::{LockError, LockResult};

/// Deadline and/or cancellation signal threaded through every lock call.
///
/// A token never fires unless it was given a deadline or made cancellable.
/// Cancellation takes precedence over the deadline when both have fired.
///
/// # Example
///
/// ```rust,ignore
/// let (token, cancel) = WaitToken::with_timeout(Duration::from_secs(5)).cancellable();
/// tokio::spawn(async move {
///     shutdown_signal().await;
///     cancel.cancel();
/// });
/// mutex.lock(&token).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct WaitToken {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels the [`WaitToken`] it was created with, and every clone of it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl WaitToken {
    /// A token with neither deadline nor cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    /// A token whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A token that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Attaches a fresh cancellation signal, replacing any previous one.
    pub fn cancellable(self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                cancel: Some(receiver),
                ..self
            },
            CancelHandle { sender },
        )
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the token's error if it has already fired.
    pub fn err(&self) -> Option<LockError> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
        {
            return Some(LockError::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(LockError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves with the token's error once it is cancelled or its deadline passes.
    ///
    /// Never resolves for a background token.
    pub async fn done(&self) -> LockError {
        let cancelled = async {
            match &self.cancel {
                Some(receiver) => {
                    let mut receiver = receiver.clone();
                    let closed = receiver.wait_for(|cancelled| *cancelled).await.is_err();
                    if closed {
                        // Handle dropped without cancelling.
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => LockError::Cancelled,
            _ = expired => LockError::DeadlineExceeded,
        }
    }

    /// Runs a single store operation, abandoning it if the token fires first.
    ///
    /// A token that has already fired returns its error without polling
    /// `operation` at all.
    pub async fn run<T, F>(&self, operation: F) -> LockResult<T>
    where
        F: Future<Output = LockResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_background_token_never_fires() {
        let token = WaitToken::background();
        assert!(token.err().is_none());

        let result = tokio::time::timeout(Duration::from_secs(3600), token.done()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let token = WaitToken::with_timeout(Duration::from_millis(100));
        assert!(token.err().is_none());

        let err = token.done().await;
        assert!(matches!(err, LockError::DeadlineExceeded));
        assert!(matches!(token.err(), Some(LockError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_cancel_reaches_clones() {
        let (token, cancel) = WaitToken::background().cancellable();
        let clone = token.clone();
        assert!(!cancel.is_cancelled());

        cancel.cancel();
        assert!(cancel.is_cancelled());
        assert!(matches!(clone.err(), Some(LockError::Cancelled)));
        assert!(matches!(token.done().await, LockError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_takes_precedence_over_deadline() {
        let (token, cancel) = WaitToken::with_timeout(Duration::from_millis(10)).cancellable();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        assert!(matches!(token.err(), Some(LockError::Cancelled)));
        assert!(matches!(token.done().await, LockError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_does_not_cancel() {
        let (token, cancel) = WaitToken::background().cancellable();
        drop(cancel);

        assert!(token.err().is_none());
        let result = tokio::time::timeout(Duration::from_secs(60), token.done()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_skips_operation_when_already_cancelled() {
        let (token, cancel) = WaitToken::background().cancellable();
        cancel.cancel();

        let mut polled = false;
        let result = token
            .run(async {
                polled = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(LockError::Cancelled)));
        assert!(!polled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_abandons_slow_operation() {
        let token = WaitToken::with_timeout(Duration::from_millis(50));

        let result: LockResult<()> = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(LockError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_run_returns_operation_result() {
        let token = WaitToken::with_timeout(Duration::from_secs(5));
        let value = token.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
