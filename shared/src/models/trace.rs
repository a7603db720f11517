//! The serialized trace record.
//!
//! A [`Trace`] is the form a completed trace takes once it has been cut
//! out of the live map: the trace ID plus every span batch that arrived
//! for it, in arrival order. This is the record type written to and read
//! back from the head block.

use crate::models::SpanBatch;
use serde::{Deserialize, Serialize};

/// A trace assembled from the span batches pushed for one trace ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// The trace ID shared by every batch in this trace.
    #[serde(with = "hex")]
    pub trace_id: Vec<u8>,

    /// All span batches received for this trace, in arrival order.
    pub batches: Vec<SpanBatch>,
}

impl Trace {
    /// Creates a new, empty trace for the given trace ID.
    #[must_use]
    pub fn new(trace_id: Vec<u8>) -> Self {
        Self {
            trace_id,
            batches: Vec::new(),
        }
    }

    /// Appends a batch to this trace, preserving arrival order.
    pub fn push_batch(&mut self, batch: SpanBatch) {
        self.batches.push(batch);
    }

    /// Returns the total number of spans across all batches.
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.batches.iter().map(SpanBatch::span_count).sum()
    }

    /// Returns the number of batches accumulated for this trace.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Returns all services that contributed spans to this trace.
    #[must_use]
    pub fn services(&self) -> Vec<&str> {
        let mut services: Vec<&str> = self
            .batches
            .iter()
            .flat_map(|b| b.spans.iter().map(|s| s.service.as_str()))
            .collect();
        services.sort_unstable();
        services.dedup();
        services
    }
}
