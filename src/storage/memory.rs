use parking_lot::RwLock;

use super::backend::{Backend, OpenBackend};
use super::batch::WriteBatch;
use super::error::StorageError;
use super::record::Snapshot;
use super::spaces::{Limits, Spaces};
use crate::config::CacheConfig;
use crate::id::PackedId;

/// A volatile backend holding all record spaces behind one lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    spaces: RwLock<Spaces>,
    limits: Limits,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            spaces: RwLock::new(Spaces::default()),
            limits,
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Bytes of info records and masks currently charged against the quota.
    pub fn payload_bytes(&self) -> usize {
        self.spaces.read().used()
    }
}

impl Backend for MemoryBackend {
    async fn read(&self, key: PackedId) -> Result<Snapshot, StorageError> {
        Ok(self.spaces.read().snapshot(key))
    }

    async fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut spaces = self.spaces.write();
        spaces.admit(&batch, &self.limits)?;
        spaces.install(batch);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<PackedId>, StorageError> {
        Ok(self.spaces.read().keys())
    }
}

impl OpenBackend for MemoryBackend {
    async fn open(config: &CacheConfig) -> Result<Self, StorageError> {
        Ok(Self::with_limits(Limits::from_config(config)))
    }
}
