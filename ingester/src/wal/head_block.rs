//! Directory-backed head block implementation.
//!
//! Each block is one append-only file named `<block-id>:<tenant>` inside
//! the WAL directory. Records are length-prefixed JSON-encoded traces;
//! an in-memory index maps trace IDs to (offset, length) for point reads.

use crate::wal::{BlockFactory, HeadBlock, WalError};
use shared::models::Trace;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Location of one record's payload within the block file.
#[derive(Debug, Clone, Copy)]
struct RecordIndex {
    start: u64,
    length: u32,
}

#[derive(Debug)]
struct BlockInner {
    /// None once the block has been cleared.
    file: Option<File>,
    index: HashMap<Vec<u8>, RecordIndex>,
    /// Insertion-ordered record count. The index deduplicates by trace ID,
    /// but a head block never sees the same trace twice: a cut trace
    /// leaves the live map, and a later push for the same ID starts a new
    /// live trace that lands in a later block.
    records: usize,
    write_offset: u64,
}

/// A head block backed by an append-only file.
#[derive(Debug)]
pub struct AppendBlock {
    id: Uuid,
    tenant: String,
    path: PathBuf,
    inner: Mutex<BlockInner>,
}

impl AppendBlock {
    fn create(dir: &Path, id: Uuid, tenant: &str) -> Result<Self, WalError> {
        let path = dir.join(format!("{id}:{tenant}"));
        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .append(true)
            .open(&path)?;

        Ok(Self {
            id,
            tenant: tenant.to_string(),
            path,
            inner: Mutex::new(BlockInner {
                file: Some(file),
                index: HashMap::new(),
                records: 0,
                write_offset: 0,
            }),
        })
    }

    /// The file this block appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HeadBlock for AppendBlock {
    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn write(&self, trace_id: &[u8], trace: &Trace) -> Result<(), WalError> {
        let payload = serde_json::to_vec(trace)?;
        let length = u32::try_from(payload.len())
            .map_err(|_| WalError::Io(std::io::Error::other("record exceeds 4GiB")))?;

        let mut record = Vec::with_capacity(4 + payload.len());
        record.extend_from_slice(&length.to_le_bytes());
        record.extend_from_slice(&payload);

        let mut inner = self.inner.lock().map_err(|_| WalError::LockPoisoned)?;
        let offset = inner.write_offset;
        let file = inner.file.as_mut().ok_or(WalError::BlockCleared(self.id))?;

        if let Err(e) = file.write_all(&record) {
            // A torn append would desync every later indexed offset, so
            // drop whatever landed and keep the next append at `offset`.
            if let Err(te) = file.set_len(offset) {
                tracing::warn!(
                    block_id = %self.id,
                    tenant = %self.tenant,
                    error = %te,
                    "Failed to truncate head block after torn append"
                );
            }
            return Err(e.into());
        }

        inner.index.insert(
            trace_id.to_vec(),
            RecordIndex {
                start: offset + 4,
                length,
            },
        );
        inner.records += 1;
        inner.write_offset = offset + 4 + u64::from(length);

        Ok(())
    }

    fn find(&self, trace_id: &[u8]) -> Result<Option<Trace>, WalError> {
        let mut inner = self.inner.lock().map_err(|_| WalError::LockPoisoned)?;

        let Some(record) = inner.index.get(trace_id).copied() else {
            return Ok(None);
        };

        let file = inner.file.as_mut().ok_or(WalError::BlockCleared(self.id))?;
        file.seek(SeekFrom::Start(record.start))?;

        let mut payload = vec![0u8; record.length as usize];
        file.read_exact(&mut payload)?;

        let trace = serde_json::from_slice(&payload)?;
        Ok(Some(trace))
    }

    fn len(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.records)
    }

    fn clear(&self) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        inner.file = None;
        inner.index.clear();
        inner.records = 0;

        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                block_id = %self.id,
                tenant = %self.tenant,
                error = %e,
                "Failed to remove cleared head block file"
            );
        }
    }
}

/// Directory-backed block factory.
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
}

impl Wal {
    /// Opens (creating if needed) the WAL directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WalError> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
}

impl BlockFactory for Wal {
    fn new_block(&self, id: Uuid, tenant: &str) -> Result<Arc<dyn HeadBlock>, WalError> {
        Ok(Arc::new(AppendBlock::create(&self.path, id, tenant)?))
    }
}
