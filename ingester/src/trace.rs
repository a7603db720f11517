//! The live trace entity.

use crate::fingerprint::TraceFingerprint;
use chrono::{DateTime, Utc};
use shared::models::{SpanBatch, Trace};

/// A trace still accumulating spans in the live map.
///
/// Not independently synchronized: the owning instance's trace-map lock
/// must be held across every access.
#[derive(Debug)]
pub(crate) struct LiveTrace {
    pub(crate) fingerprint: TraceFingerprint,
    pub(crate) trace: Trace,
    pub(crate) last_append: DateTime<Utc>,
}

impl LiveTrace {
    pub(crate) fn new(fingerprint: TraceFingerprint, trace_id: Vec<u8>) -> Self {
        Self {
            fingerprint,
            trace: Trace::new(trace_id),
            last_append: Utc::now(),
        }
    }

    /// Appends the batch's spans and refreshes `last_append`.
    pub(crate) fn push(&mut self, batch: &SpanBatch) {
        self.trace.push_batch(batch.clone());
        self.last_append = Utc::now();
    }
}
