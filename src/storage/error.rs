use thiserror::Error;

use super::record::RecordSpace;
use crate::id::PackedId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("quota exceeded writing {space} for {key}: {requested} bytes requested, {available} available")]
    QuotaExceeded {
        key: PackedId,
        space: RecordSpace,
        requested: usize,
        available: usize,
    },

    #[error("mask for {key} is {len} bytes, limit is {max}")]
    MaskTooLarge { key: PackedId, len: usize, max: usize },

    /// The batch would encode to a journal frame above the frame limit.
    #[error("batch encodes to {len} bytes, frame limit is {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("journal corrupt at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// An earlier write left the journal in a state that further appends could
    /// not be replayed from. Reopen the backend to recover.
    #[error("journal disabled: {reason}")]
    Poisoned { reason: String },
}

impl StorageError {
    /// The identifier whose write was refused, if the failure is tied to one.
    pub fn key(&self) -> Option<PackedId> {
        match self {
            StorageError::QuotaExceeded { key, .. } | StorageError::MaskTooLarge { key, .. } => {
                Some(*key)
            }
            StorageError::Io(_)
            | StorageError::FrameTooLarge { .. }
            | StorageError::Corrupt { .. }
            | StorageError::Poisoned { .. } => None,
        }
    }
}
