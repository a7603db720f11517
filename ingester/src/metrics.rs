//! Injected metrics sink.
//!
//! Instances report counters through a sink passed in at construction
//! rather than a process-global registry, so tests and embedders can
//! observe them directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Sink for the counters an instance emits.
pub trait MetricsSink: Send + Sync {
    /// Records that a new live trace was created for the tenant.
    /// Called exactly once per created trace.
    fn inc_traces_created(&self, tenant: &str);
}

/// In-process metrics sink backed by per-tenant atomic counters.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    traces_created: RwLock<HashMap<String, AtomicU64>>,
}

impl AtomicMetrics {
    /// Creates a new sink with no counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of traces created for the tenant so far.
    #[must_use]
    pub fn traces_created(&self, tenant: &str) -> u64 {
        self.traces_created
            .read()
            .map(|counters| {
                counters
                    .get(tenant)
                    .map_or(0, |c| c.load(Ordering::Relaxed))
            })
            .unwrap_or(0)
    }
}

impl MetricsSink for AtomicMetrics {
    fn inc_traces_created(&self, tenant: &str) {
        if let Ok(counters) = self.traces_created.read() {
            if let Some(counter) = counters.get(tenant) {
                counter.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        if let Ok(mut counters) = self.traces_created.write() {
            counters
                .entry(tenant.to_string())
                .or_default()
                .fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_zero() {
        let metrics = AtomicMetrics::new();
        assert_eq!(metrics.traces_created("fake"), 0);
    }

    #[test]
    fn test_counter_increments_per_tenant() {
        let metrics = AtomicMetrics::new();
        metrics.inc_traces_created("fake");
        metrics.inc_traces_created("fake");
        metrics.inc_traces_created("other");

        assert_eq!(metrics.traces_created("fake"), 2);
        assert_eq!(metrics.traces_created("other"), 1);
    }
}
