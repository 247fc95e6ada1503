use std::sync::Arc;

use thiserror::Error;

use crate::bitfield::CodecError;
use crate::id::PackedId;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid identifier: {0}")]
    Codec(#[from] CodecError),

    /// Opening the backend failed. Every operation on the handle reports the
    /// same underlying error.
    #[error("cache storage unavailable: {0}")]
    StorageUnavailable(Arc<StorageError>),

    /// A write was refused and none of its entries became visible.
    #[error("write of {entries} cutout(s) not committed: {source}")]
    PartialWrite {
        entries: usize,
        failed: Option<PackedId>,
        #[source]
        source: StorageError,
    },

    #[error("invalid record for {key}: {reason}")]
    InvalidRecord { key: PackedId, reason: &'static str },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
