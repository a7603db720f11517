//! Errors surfaced by the ingestion core.

use crate::limiter::LimitError;
use crate::wal::WalError;
use thiserror::Error;

/// Errors that can occur while pushing, cutting, or rotating.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The pushed batch contained no spans. Nothing was mutated.
    #[error("invalid request received with 0 spans")]
    EmptyBatch,

    /// The limiter rejected creation of a new trace. Retryable by the
    /// caller once the tenant's live-trace count drops.
    #[error(transparent)]
    RateLimited(#[from] LimitError),

    /// A head block operation failed.
    #[error(transparent)]
    Wal(#[from] WalError),

    /// A lock was poisoned by a panicking writer.
    #[error("failed to acquire lock on instance state")]
    LockPoisoned,

    /// A rotation was attempted while another rotation was still running.
    /// Each instance supports exactly one rotation driver.
    #[error("block rotation already in progress")]
    RotationInProgress,
}

impl IngestError {
    /// Returns true if the error is the retryable over-quota signal.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}
