//! The cooperative rotation driver.
//!
//! Each instance has exactly one flusher running its cut / ready /
//! persist / rotate cycle. Because the flusher is the only caller of
//! `cut_complete_traces` and `reset_block`, no cuts land between its
//! persistence pass and the rotation that follows, closing the
//! get/persist/reset race surface for the common deployment.

use crate::instance::TenantInstance;
use crate::wal::HeadBlock;
use anyhow::Context;
use chrono::TimeDelta;
use shared::config::IngesterConfig;
use std::sync::Arc;
use tokio::time::interval;

/// Durably persists a finished head block before it is cleared.
///
/// Implementations typically upload the block to long-term storage. No
/// retry is performed here; a failed cycle is retried wholesale on the
/// next tick.
pub trait BlockPersister: Send + Sync {
    /// Persists the block's full contents.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails; the block is then left in
    /// place and the flusher retries on its next cycle.
    fn persist(&self, block: &dyn HeadBlock) -> anyhow::Result<()>;
}

/// Background driver for one instance's flush cycle.
pub struct Flusher {
    instance: Arc<TenantInstance>,
    persister: Arc<dyn BlockPersister>,
    config: IngesterConfig,
}

impl Flusher {
    /// Creates a flusher for the instance.
    ///
    /// Run at most one flusher per instance; a second one's rotations
    /// would be rejected with `RotationInProgress`.
    #[must_use]
    pub fn new(
        instance: Arc<TenantInstance>,
        persister: Arc<dyn BlockPersister>,
        config: IngesterConfig,
    ) -> Self {
        Self {
            instance,
            persister,
            config,
        }
    }

    /// Runs one cut / ready / persist / rotate cycle.
    ///
    /// Returns true if the head block was persisted and rotated.
    ///
    /// # Errors
    ///
    /// Returns an error if the cut pass, persistence, or rotation fails.
    /// Partial cut progress is kept and retried on the next cycle.
    pub fn run_cycle(&self) -> anyhow::Result<bool> {
        let idle = TimeDelta::from_std(self.config.trace_idle_period)
            .unwrap_or_else(|_| TimeDelta::MAX);
        self.instance
            .cut_complete_traces(-idle, false)
            .context("cutting complete traces")?;

        if !self.instance.is_block_ready(
            self.config.max_traces_per_block,
            self.config.max_block_lifetime,
        ) {
            return Ok(false);
        }

        let block = self.instance.get_block();
        self.persister
            .persist(block.as_ref())
            .context("persisting head block")?;

        self.instance
            .reset_block()
            .context("rotating head block")?;

        Ok(true)
    }

    /// Starts the flush loop.
    ///
    /// Runs until the owning task is cancelled, driving one cycle per
    /// configured check period. Errors are logged and the cycle retried
    /// on the next tick.
    pub async fn run(self) {
        let mut tick = interval(self.config.flush_check_period);

        loop {
            tick.tick().await;

            match self.run_cycle() {
                Ok(true) => {
                    tracing::info!(
                        tenant = %self.instance.tenant_id(),
                        "Persisted and rotated head block"
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        tenant = %self.instance.tenant_id(),
                        error = %e,
                        "Flush cycle failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::Limiter;
    use crate::metrics::AtomicMetrics;
    use crate::wal::Wal;
    use shared::config::LimitOverrides;
    use shared::models::{Span, SpanBatch};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    /// Records the IDs and lengths of persisted blocks.
    #[derive(Default)]
    struct RecordingPersister {
        persisted: Mutex<Vec<(Uuid, usize)>>,
        fail: bool,
    }

    impl BlockPersister for RecordingPersister {
        fn persist(&self, block: &dyn HeadBlock) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("upload failed");
            }
            self.persisted
                .lock()
                .unwrap()
                .push((block.id(), block.len()));
            Ok(())
        }
    }

    fn test_setup(dir: &TempDir) -> Arc<TenantInstance> {
        let wal = Arc::new(Wal::new(dir.path()).unwrap());
        Arc::new(
            TenantInstance::new(
                "fake",
                Limiter::new(LimitOverrides::default()),
                wal,
                Arc::new(AtomicMetrics::new()),
            )
            .unwrap(),
        )
    }

    fn config() -> IngesterConfig {
        IngesterConfig {
            trace_idle_period: Duration::ZERO,
            max_traces_per_block: 1,
            max_block_lifetime: Duration::from_secs(3600),
            flush_check_period: Duration::from_millis(10),
            wal_path: std::env::temp_dir(),
        }
    }

    fn batch(trace_id: &[u8]) -> SpanBatch {
        SpanBatch::new(vec![Span::new(trace_id.to_vec(), vec![0xaa], "op", "api")])
    }

    #[test]
    fn test_cycle_is_idle_without_traffic() {
        let dir = TempDir::new().unwrap();
        let instance = test_setup(&dir);
        let persister = Arc::new(RecordingPersister::default());
        let flusher = Flusher::new(instance, persister.clone(), config());

        assert!(!flusher.run_cycle().unwrap());
        assert!(persister.persisted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cycle_persists_and_rotates_when_ready() {
        let dir = TempDir::new().unwrap();
        let instance = test_setup(&dir);
        let persister = Arc::new(RecordingPersister::default());
        let flusher = Flusher::new(instance.clone(), persister.clone(), config());

        instance.push(&batch(&[0x01])).unwrap();
        let old_id = instance.get_block().id();

        assert!(flusher.run_cycle().unwrap());

        let persisted = persister.persisted.lock().unwrap();
        assert_eq!(*persisted, vec![(old_id, 1)]);
        drop(persisted);

        // Rotation installed a fresh, empty block.
        assert_ne!(instance.get_block().id(), old_id);
        assert_eq!(instance.get_block().len(), 0);
        assert_eq!(instance.live_trace_count().unwrap(), 0);
    }

    #[test]
    fn test_persist_failure_leaves_block_in_place() {
        let dir = TempDir::new().unwrap();
        let instance = test_setup(&dir);
        let persister = Arc::new(RecordingPersister {
            persisted: Mutex::new(Vec::new()),
            fail: true,
        });
        let flusher = Flusher::new(instance.clone(), persister, config());

        instance.push(&batch(&[0x01])).unwrap();
        let old_id = instance.get_block().id();

        assert!(flusher.run_cycle().is_err());

        // The cut landed but the block was neither cleared nor rotated.
        assert_eq!(instance.get_block().id(), old_id);
        assert_eq!(instance.get_block().len(), 1);
    }

    #[tokio::test]
    async fn test_run_loop_drives_rotation() {
        let dir = TempDir::new().unwrap();
        let instance = test_setup(&dir);
        let persister = Arc::new(RecordingPersister::default());
        let flusher = Flusher::new(instance.clone(), persister.clone(), config());

        instance.push(&batch(&[0x01])).unwrap();

        let handle = tokio::spawn(flusher.run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(persister.persisted.lock().unwrap().len(), 1);
        assert_eq!(instance.get_block().len(), 0);
    }
}
