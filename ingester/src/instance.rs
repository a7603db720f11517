//! The per-tenant ingestion instance.
//!
//! A [`TenantInstance`] owns all live trace state for one tenant: the
//! fingerprint-keyed live map and the current head block. Concurrent
//! callers push span batches; a single cooperative driver per instance
//! runs the cut / ready / persist / rotate cycle.
//!
//! # Locking
//!
//! Two independently-scoped locks protect disjoint state:
//!
//! - the trace-map lock guards creation, mutation, and deletion of live
//!   traces;
//! - the block lock guards the head block handle and `last_block_cut`.
//!
//! `push` takes only the trace-map lock and performs no durable I/O.
//! `is_block_ready` takes only the block lock, in read mode. A cut takes
//! both, trace map first, through [`TenantInstance::lock_traces_then_block`]
//! — the one code path allowed to hold both. Any new path that needs both
//! locks must go through that helper; acquiring them in the reverse order
//! would deadlock against a concurrent cut.

use crate::error::IngestError;
use crate::fingerprint::TraceFingerprint;
use crate::limiter::Limiter;
use crate::metrics::MetricsSink;
use crate::trace::LiveTrace;
use crate::wal::{BlockFactory, HeadBlock};
use chrono::{DateTime, TimeDelta, Utc};
use shared::models::{SpanBatch, Trace};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockWriteGuard};
use std::time::Duration;
use uuid::Uuid;

/// Head block state guarded by the block lock.
struct BlockState {
    head_block: Arc<dyn HeadBlock>,
    last_block_cut: DateTime<Utc>,
}

/// The per-tenant unit of ingestion isolation.
///
/// A trace is live (in the map) or cut (in the head block), never both
/// and never neither once created. The head block handle is valid for the
/// whole lifetime of the instance; rotation replaces it atomically under
/// the block lock.
pub struct TenantInstance {
    traces: Mutex<HashMap<TraceFingerprint, LiveTrace>>,
    block: RwLock<BlockState>,

    /// Held for the duration of `reset_block`. A second rotation attempt
    /// fails with `RotationInProgress` instead of racing the first.
    rotation: Mutex<()>,

    tenant_id: String,
    limiter: Limiter,
    factory: Arc<dyn BlockFactory>,
    metrics: Arc<dyn MetricsSink>,
}

impl TenantInstance {
    /// Creates an instance for the tenant, allocating its first head block.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial head block cannot be created.
    pub fn new(
        tenant_id: impl Into<String>,
        limiter: Limiter,
        factory: Arc<dyn BlockFactory>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, IngestError> {
        let tenant_id = tenant_id.into();
        let head_block = factory.new_block(Uuid::new_v4(), &tenant_id)?;

        Ok(Self {
            traces: Mutex::new(HashMap::new()),
            block: RwLock::new(BlockState {
                head_block,
                last_block_cut: Utc::now(),
            }),
            rotation: Mutex::new(()),
            tenant_id,
            limiter,
            factory,
            metrics,
        })
    }

    /// The tenant this instance ingests for.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Appends a span batch to its live trace, creating the trace if this
    /// is the first batch for its fingerprint.
    ///
    /// Caller contract: all spans in the batch share one trace ID (the
    /// distributor separates spans by trace ID upstream).
    ///
    /// # Errors
    ///
    /// - [`IngestError::EmptyBatch`] if the batch has no spans; nothing is
    ///   mutated.
    /// - [`IngestError::RateLimited`] if the limiter rejects a new trace;
    ///   appends to existing traces are never limited.
    pub fn push(&self, batch: &SpanBatch) -> Result<(), IngestError> {
        let mut traces = self.traces.lock().map_err(|_| IngestError::LockPoisoned)?;

        let trace = Self::get_or_create_trace(
            &mut traces,
            batch,
            &self.tenant_id,
            &self.limiter,
            self.metrics.as_ref(),
        )?;
        trace.push(batch);

        Ok(())
    }

    /// Returns the number of live traces currently buffered.
    ///
    /// # Errors
    ///
    /// Returns an error if the trace-map lock is poisoned.
    pub fn live_trace_count(&self) -> Result<usize, IngestError> {
        let traces = self.traces.lock().map_err(|_| IngestError::LockPoisoned)?;
        Ok(traces.len())
    }

    /// Moves complete traces out of the live map into the head block.
    ///
    /// A trace is selected when `now + cutoff` is after its last append,
    /// or unconditionally when `immediate` is true. `cutoff` is a signed
    /// offset: a driver cutting traces idle for at least some period
    /// passes that period negated. Selected traces are appended to the
    /// head block and removed from the map.
    ///
    /// Holds both locks for the whole pass, so no push can create or
    /// mutate a trace while its cut decision is being made and no reader
    /// observes a partially-cut block. Large cuts can therefore stall
    /// concurrent pushes; that throughput cost is accepted.
    ///
    /// # Errors
    ///
    /// On the first head-block write failure the pass aborts and the error
    /// is returned. Traces already cut in the pass stay cut; there is no
    /// rollback.
    pub fn cut_complete_traces(
        &self,
        cutoff: TimeDelta,
        immediate: bool,
    ) -> Result<(), IngestError> {
        let (mut traces, block) = self.lock_traces_then_block()?;

        let now = Utc::now();
        // Saturate instead of panicking on extreme cutoffs: an offset past
        // the calendar's edge selects everything (or nothing).
        let deadline = now.checked_add_signed(cutoff).unwrap_or(if cutoff < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });

        let selected: Vec<TraceFingerprint> = traces
            .values()
            .filter(|t| immediate || deadline > t.last_append)
            .map(|t| t.fingerprint)
            .collect();

        let mut cut = 0usize;
        for fingerprint in selected {
            if let Some(live) = traces.get(&fingerprint) {
                block.head_block.write(&live.trace.trace_id, &live.trace)?;
                traces.remove(&fingerprint);
                cut += 1;
            }
        }

        if cut > 0 {
            tracing::debug!(
                tenant = %self.tenant_id,
                cut,
                remaining = traces.len(),
                block_len = block.head_block.len(),
                "Cut complete traces into head block"
            );
        }

        Ok(())
    }

    /// Returns true if the head block should be persisted and rotated:
    /// it holds at least `max_traces` traces, or more than `max_lifetime`
    /// has elapsed since the last rotation.
    ///
    /// Read-only; takes the block lock in shared mode and is concurrent
    /// with pushes.
    #[must_use]
    pub fn is_block_ready(&self, max_traces: usize, max_lifetime: Duration) -> bool {
        let Ok(block) = self.block.read() else {
            return false;
        };

        // A lifetime too large to add onto the last cut time can never
        // elapse, so the block is only ready by length.
        let age_exceeded = block
            .last_block_cut
            .checked_add_signed(to_delta(max_lifetime))
            .is_some_and(|deadline| Utc::now() > deadline);

        block.head_block.len() >= max_traces || age_exceeded
    }

    /// Returns a handle to the current head block.
    ///
    /// The handle is shared, not a snapshot: concurrent cuts may still
    /// append to it. The rotation driver must sequence its persistence
    /// pass against further cuts (or accept that the persisted contents
    /// trail whatever cuts land concurrently).
    #[must_use]
    pub fn get_block(&self) -> Arc<dyn HeadBlock> {
        match self.block.read() {
            Ok(block) => Arc::clone(&block.head_block),
            Err(poisoned) => Arc::clone(&poisoned.into_inner().head_block),
        }
    }

    /// Rotates the head block: releases the current block's resources,
    /// installs a fresh one, and advances `last_block_cut`.
    ///
    /// Must be called only after the old block's contents were durably
    /// persisted elsewhere — calling earlier loses data; that sequencing
    /// belongs to the rotation driver.
    ///
    /// # Errors
    ///
    /// - [`IngestError::RotationInProgress`] if another rotation is still
    ///   running; each instance supports exactly one rotation driver.
    /// - [`IngestError::Wal`] if the replacement block cannot be created.
    pub fn reset_block(&self) -> Result<(), IngestError> {
        let _rotation = self
            .rotation
            .try_lock()
            .map_err(|_| IngestError::RotationInProgress)?;

        let new_block = self
            .factory
            .new_block(Uuid::new_v4(), &self.tenant_id)?;

        let mut block = self.block.write().map_err(|_| IngestError::LockPoisoned)?;
        block.head_block.clear();

        let old_id = block.head_block.id();
        block.head_block = new_block;
        block.last_block_cut = Utc::now();

        tracing::debug!(
            tenant = %self.tenant_id,
            old_block = %old_id,
            new_block = %block.head_block.id(),
            "Rotated head block"
        );

        Ok(())
    }

    /// Looks up a trace by exact ID within the head block.
    ///
    /// Spans still buffered in live traces are not visible here until
    /// they are cut.
    ///
    /// # Errors
    ///
    /// Propagates head-block read failures. A missing trace is `Ok(None)`.
    pub fn find_trace_by_id(&self, trace_id: &[u8]) -> Result<Option<Trace>, IngestError> {
        let block = self.block.read().map_err(|_| IngestError::LockPoisoned)?;
        Ok(block.head_block.find(trace_id)?)
    }

    /// Acquires the trace-map lock, then the block lock, in that fixed
    /// order. The only code path allowed to hold both.
    fn lock_traces_then_block(
        &self,
    ) -> Result<
        (
            MutexGuard<'_, HashMap<TraceFingerprint, LiveTrace>>,
            RwLockWriteGuard<'_, BlockState>,
        ),
        IngestError,
    > {
        let traces = self.traces.lock().map_err(|_| IngestError::LockPoisoned)?;
        let block = self.block.write().map_err(|_| IngestError::LockPoisoned)?;
        Ok((traces, block))
    }

    /// Looks up the live trace for the batch's fingerprint, creating it if
    /// admission passes. Callers hold the trace-map lock.
    fn get_or_create_trace<'a>(
        traces: &'a mut HashMap<TraceFingerprint, LiveTrace>,
        batch: &SpanBatch,
        tenant_id: &str,
        limiter: &Limiter,
        metrics: &dyn MetricsSink,
    ) -> Result<&'a mut LiveTrace, IngestError> {
        let trace_id = batch.trace_id().ok_or(IngestError::EmptyBatch)?;
        let fingerprint = TraceFingerprint::of(trace_id);

        let live_count = traces.len();
        match traces.entry(fingerprint) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                limiter.assert_max_traces_per_tenant(tenant_id, live_count)?;

                tracing::debug!(
                    tenant = %tenant_id,
                    trace_id = %hex::encode(trace_id),
                    fingerprint = %fingerprint,
                    "Created live trace"
                );
                metrics.inc_traces_created(tenant_id);

                Ok(entry.insert(LiveTrace::new(fingerprint, trace_id.to_vec())))
            }
        }
    }
}

/// Converts a caller-supplied duration, saturating rather than failing on
/// out-of-range values.
fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}
