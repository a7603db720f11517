//! The write-ahead head block.
//!
//! A head block is the append-only container a tenant instance cuts
//! completed traces into. The instance consumes the [`HeadBlock`] and
//! [`BlockFactory`] traits only; [`Wal`] provides the directory-backed
//! implementation used in production.

mod head_block;

pub use head_block::{AppendBlock, Wal};

use shared::models::Trace;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors from head block operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying file operation failed.
    #[error("head block I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A trace record could not be encoded or decoded.
    #[error("head block record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The block's resources were already released.
    #[error("head block {0} has been cleared")]
    BlockCleared(Uuid),

    /// The block's internal lock was poisoned.
    #[error("failed to acquire lock on head block")]
    LockPoisoned,
}

/// An append-only sequence of (trace ID, trace) records with point lookup.
///
/// Writes preserve insertion order, which later conversion to long-term
/// columnar storage relies on.
pub trait HeadBlock: Send + Sync {
    /// The block's unique identifier.
    fn id(&self) -> Uuid;

    /// The tenant this block belongs to.
    fn tenant(&self) -> &str;

    /// Appends one trace record.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the underlying append fails, or if
    /// the block has already been cleared.
    fn write(&self, trace_id: &[u8], trace: &Trace) -> Result<(), WalError>;

    /// Exact-match point lookup by trace ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read or decode fails. A missing
    /// trace is `Ok(None)`, not an error.
    fn find(&self, trace_id: &[u8]) -> Result<Option<Trace>, WalError>;

    /// Number of trace records appended so far.
    fn len(&self) -> usize;

    /// Returns true if no records have been appended.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases the block's underlying resources.
    ///
    /// Safe only once the contents are durably persisted elsewhere.
    /// Release is best-effort; failures are logged, not returned.
    fn clear(&self);
}

/// Creates fresh head blocks, one per rotation.
pub trait BlockFactory: Send + Sync {
    /// Allocates a new, empty head block for the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the block's backing resources cannot be created.
    fn new_block(&self, id: Uuid, tenant: &str) -> Result<Arc<dyn HeadBlock>, WalError>;
}
