//! Data models for the Spanlake ingestion pipeline.

pub mod span;
pub mod trace;

pub use span::{BatchValidationError, Span, SpanBatch, SpanKind, SpanStatus};
pub use trace::Trace;
