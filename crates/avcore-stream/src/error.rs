//! Error types for `avcore-stream` async wrappers.

use avcore::FifoError;
use thiserror::Error;

/// Errors that can occur on the async wrapper surface. Wraps the blocking
/// [`FifoError`] and adds the one failure mode that only exists once a
/// `tokio::task::spawn_blocking` is in the picture: the blocking task itself
/// panicking or being cancelled.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Fifo(#[from] FifoError),

    /// The `spawn_blocking` task panicked or was cancelled before returning.
    #[error("background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl StreamError {
    /// Returns `true` if this is a recoverable error (e.g. `FifoFull`, `Timeout`).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamError::Fifo(FifoError::FifoFull | FifoError::Timeout)
        )
    }

    /// Returns `true` if the FIFO has been shut down and will not recover.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamError::Fifo(FifoError::FlowDisabled))
    }
}
