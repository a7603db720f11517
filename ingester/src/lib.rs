//! Spanlake Ingestion Core
//!
//! This crate implements the per-tenant ingestion instance for the Spanlake
//! tracing backend: it accepts span batches, groups them into live traces,
//! cuts idle traces into an append-only head block, and coordinates the
//! handoff of that block to a flush driver for durable persistence.
//!
//! # Architecture
//!
//! - [`TenantInstance`] owns the live-trace map and the current head block,
//!   guarded by two independently-scoped locks (trace map first, block
//!   second — always in that order).
//! - [`wal`] provides the append-only head block the instance cuts into.
//! - [`Flusher`] is the single cooperative driver per instance that runs
//!   the cut / ready / persist / rotate cycle.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ingester::{AtomicMetrics, Limiter, TenantInstance};
//! use ingester::wal::Wal;
//! use shared::config::LimitOverrides;
//! use shared::models::{Span, SpanBatch};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let wal = Arc::new(Wal::new("/var/spanlake/wal")?);
//! let limiter = Limiter::new(LimitOverrides::default());
//! let metrics = Arc::new(AtomicMetrics::new());
//!
//! let instance = TenantInstance::new("tenant-a", limiter, wal, metrics)?;
//! instance.push(&SpanBatch::new(vec![Span::new(
//!     vec![0x01],
//!     vec![0xaa],
//!     "GET /api",
//!     "api-service",
//! )]))?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod fingerprint;
mod flusher;
mod instance;
mod limiter;
mod metrics;
mod trace;
pub mod wal;

pub use error::IngestError;
pub use fingerprint::TraceFingerprint;
pub use flusher::{BlockPersister, Flusher};
pub use instance::TenantInstance;
pub use limiter::{LimitError, Limiter};
pub use metrics::{AtomicMetrics, MetricsSink};
