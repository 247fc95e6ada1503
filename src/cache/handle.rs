use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::OnceCell;

use super::cutout_cache::CutoutCache;
use super::error::CacheError;
use super::record::Lookup;
use crate::config::CacheConfig;
use crate::id::WordId;
use crate::storage::{CutoutInfo, FileBackend, OpenBackend, StorageError};

/// The process's cache handle: opened once, on first use, and shared.
///
/// Create one at startup and pass it by reference. The backend is opened by
/// the first operation; concurrent first callers wait on the same attempt. If
/// opening fails, the failure is kept and every later call returns
/// [`CacheError::StorageUnavailable`] with the original error, without
/// retrying.
pub struct CacheHandle<B = FileBackend> {
    config: CacheConfig,
    cache: OnceCell<Result<CutoutCache<B>, Arc<StorageError>>>,
}

impl<B: OpenBackend> CacheHandle<B> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            cache: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether the backend has been opened successfully.
    pub fn is_open(&self) -> bool {
        matches!(self.cache.get(), Some(Ok(_)))
    }

    /// Returns the cache, opening the backend on first use.
    pub async fn cache(&self) -> Result<&CutoutCache<B>, CacheError> {
        let opened = self
            .cache
            .get_or_init(|| async {
                match B::open(&self.config).await {
                    Ok(backend) => {
                        tracing::info!(
                            directory = %self.config.directory().display(),
                            "cutout cache ready"
                        );
                        Ok(CutoutCache::new(backend))
                    }
                    Err(e) => {
                        tracing::error!(
                            directory = %self.config.directory().display(),
                            error = %e,
                            "cutout cache unavailable"
                        );
                        Err(Arc::new(e))
                    }
                }
            })
            .await;
        opened
            .as_ref()
            .map_err(|e| CacheError::StorageUnavailable(Arc::clone(e)))
    }

    pub async fn put_one(
        &self,
        id: &WordId,
        info: CutoutInfo,
        mask: Bytes,
    ) -> Result<(), CacheError> {
        self.cache().await?.put_one(id, info, mask).await
    }

    pub async fn put_many<I>(&self, entries: I) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = (WordId, CutoutInfo, Bytes)>,
    {
        self.cache().await?.put_many(entries).await
    }

    pub async fn get_one(&self, id: &WordId) -> Result<Lookup, CacheError> {
        self.cache().await?.get_one(id).await
    }

    pub async fn get_many(&self, ids: &[WordId]) -> Result<Vec<Lookup>, CacheError> {
        self.cache().await?.get_many(ids).await
    }

    pub async fn invalidate(&self, id: &WordId) -> Result<bool, CacheError> {
        self.cache().await?.invalidate(id).await
    }

    pub async fn mark_absent(&self, id: &WordId) -> Result<bool, CacheError> {
        self.cache().await?.mark_absent(id).await
    }

    pub async fn forget(&self, id: &WordId) -> Result<bool, CacheError> {
        self.cache().await?.forget(id).await
    }
}
