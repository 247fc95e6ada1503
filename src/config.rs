//! Cache configuration.

use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_MAX_MASK_LEN, DEFAULT_QUOTA_BYTES, MAX_FRAME_LEN};

/// Settings for opening a cache backend.
///
/// # Examples
///
/// ```
/// use cutout_store::CacheConfig;
///
/// let config = CacheConfig::new("/var/cache/cutouts")
///     .with_quota(64 * 1024 * 1024)
///     .with_sync_writes(false);
/// assert_eq!(config.quota_bytes(), 64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    directory: PathBuf,
    quota_bytes: usize,
    max_mask_len: usize,
    max_frame_len: usize,
    sync_writes: bool,
}

impl CacheConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Limits the bytes of info records and masks the cache may hold.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = bytes;
        self
    }

    pub fn with_max_mask_len(mut self, bytes: usize) -> Self {
        self.max_mask_len = bytes;
        self
    }

    /// Largest journal frame a single batch may produce. Capped at
    /// [`MAX_FRAME_LEN`].
    pub fn with_max_frame_len(mut self, bytes: usize) -> Self {
        self.max_frame_len = bytes.min(MAX_FRAME_LEN);
        self
    }

    /// Whether each committed batch is synced to disk before it becomes visible.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }

    pub fn max_mask_len(&self) -> usize {
        self.max_mask_len
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn sync_writes(&self) -> bool {
        self.sync_writes
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("cutout-cache"),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            max_mask_len: DEFAULT_MAX_MASK_LEN,
            max_frame_len: MAX_FRAME_LEN,
            sync_writes: true,
        }
    }
}
