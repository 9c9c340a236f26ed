//! Error types for distributed lock operations.

use thiserror::Error;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// A live lease on the key is held by a different owner.
    #[error("lock already acquired")]
    AlreadyAcquired,

    /// The wait token was cancelled.
    #[error("lock operation was cancelled")]
    Cancelled,

    /// The wait token's deadline passed.
    #[error("lock operation deadline exceeded")]
    DeadlineExceeded,

    /// The lock store could not be reached while setting it up.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The lock store failed while performing an operation.
    #[error("backend error during {operation}: {source}")]
    Backend {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Builder or config validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LockError {
    /// Wraps a store failure with the name of the operation that failed.
    pub fn backend(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for the conflict outcome.
    pub fn is_already_acquired(&self) -> bool {
        matches!(self, Self::AlreadyAcquired)
    }

    /// Returns `true` when the error came from the wait token rather than the store.
    pub fn is_wait_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
