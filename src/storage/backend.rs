use std::future::Future;

use super::batch::WriteBatch;
use super::error::StorageError;
use super::record::Snapshot;
use crate::config::CacheConfig;
use crate::id::PackedId;

/// Keyed storage for the three record spaces.
///
/// Implementations must make `apply` all-or-nothing: if it returns an error,
/// no op of the batch is visible to any reader, and a concurrent `read` sees
/// either none or all of a batch's ops.
pub trait Backend: Send + Sync + 'static {
    /// Reads every record space of `key` as one consistent snapshot.
    fn read(&self, key: PackedId) -> impl Future<Output = Result<Snapshot, StorageError>> + Send;

    /// Commits `batch` atomically.
    fn apply(&self, batch: WriteBatch) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Every identifier with a record in any space.
    fn keys(&self) -> impl Future<Output = Result<Vec<PackedId>, StorageError>> + Send;
}

/// A backend that can be created from configuration.
pub trait OpenBackend: Backend + Sized {
    fn open(config: &CacheConfig) -> impl Future<Output = Result<Self, StorageError>> + Send;
}
