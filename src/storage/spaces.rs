use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;

use super::batch::{WriteBatch, WriteOp};
use super::error::StorageError;
use super::record::{CutoutInfo, RecordSpace, Snapshot};
use crate::config::CacheConfig;
use crate::constants::{DEFAULT_MAX_MASK_LEN, DEFAULT_QUOTA_BYTES, INFO_RECORD_COST, MAX_FRAME_LEN};
use crate::id::PackedId;

/// Size limits enforced when a batch is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub quota_bytes: usize,
    pub max_mask_len: usize,
    /// Largest encoded batch a journal will accept in one frame.
    pub max_frame_len: usize,
}

impl Limits {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            quota_bytes: config.quota_bytes(),
            max_mask_len: config.max_mask_len(),
            max_frame_len: config.max_frame_len().min(MAX_FRAME_LEN),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            quota_bytes: DEFAULT_QUOTA_BYTES,
            max_mask_len: DEFAULT_MAX_MASK_LEN,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

/// The three record spaces held in memory, plus payload accounting.
#[derive(Debug, Clone, Default)]
pub(crate) struct Spaces {
    exists: HashMap<PackedId, bool>,
    info: HashMap<PackedId, CutoutInfo>,
    masks: HashMap<PackedId, Bytes>,
    used: usize,
}

impl Spaces {
    fn stored_size(&self, key: PackedId, space: RecordSpace) -> usize {
        match space {
            RecordSpace::Exists => 0,
            RecordSpace::Info if self.info.contains_key(&key) => INFO_RECORD_COST,
            RecordSpace::Info => 0,
            RecordSpace::Mask => self.masks.get(&key).map_or(0, Bytes::len),
        }
    }

    /// Checks that the whole batch fits the limits without modifying anything.
    ///
    /// Returns the payload size after the batch would be installed. The first
    /// op that breaks a limit determines the error.
    pub(crate) fn admit(&self, batch: &WriteBatch, limits: &Limits) -> Result<usize, StorageError> {
        let mut staged: HashMap<(PackedId, RecordSpace), usize> = HashMap::new();
        let mut used = self.used;

        for op in batch.ops() {
            let key = op.key();
            let space = op.space();
            let old = staged
                .get(&(key, space))
                .copied()
                .unwrap_or_else(|| self.stored_size(key, space));
            let new = match op {
                WriteOp::PutInfo { .. } => INFO_RECORD_COST,
                WriteOp::PutMask { mask, .. } => {
                    if mask.len() > limits.max_mask_len {
                        return Err(StorageError::MaskTooLarge {
                            key,
                            len: mask.len(),
                            max: limits.max_mask_len,
                        });
                    }
                    mask.len()
                }
                WriteOp::SetExists { .. } | WriteOp::Remove { .. } => 0,
            };

            let base = used - old;
            if new > old && base + new > limits.quota_bytes {
                return Err(StorageError::QuotaExceeded {
                    key,
                    space,
                    requested: new,
                    available: limits.quota_bytes.saturating_sub(base),
                });
            }
            used = base + new;
            staged.insert((key, space), new);
        }

        Ok(used)
    }

    /// Applies an admitted batch.
    pub(crate) fn install(&mut self, batch: WriteBatch) {
        for op in batch.into_ops() {
            match op {
                WriteOp::PutInfo { key, info } => {
                    if self.info.insert(key, info).is_none() {
                        self.used += INFO_RECORD_COST;
                    }
                }
                WriteOp::PutMask { key, mask } => {
                    let new = mask.len();
                    let old = self.masks.insert(key, mask).map_or(0, |m| m.len());
                    self.used = self.used - old + new;
                }
                WriteOp::SetExists { key, exists } => {
                    self.exists.insert(key, exists);
                }
                WriteOp::Remove { key, space } => match space {
                    RecordSpace::Exists => {
                        self.exists.remove(&key);
                    }
                    RecordSpace::Info => {
                        if self.info.remove(&key).is_some() {
                            self.used -= INFO_RECORD_COST;
                        }
                    }
                    RecordSpace::Mask => {
                        if let Some(mask) = self.masks.remove(&key) {
                            self.used -= mask.len();
                        }
                    }
                },
            }
        }
    }

    pub(crate) fn snapshot(&self, key: PackedId) -> Snapshot {
        Snapshot {
            exists: self.exists.get(&key).copied(),
            info: self.info.get(&key).copied(),
            mask: self.masks.get(&key).cloned(),
        }
    }

    /// Every identifier present in any space, ascending.
    pub(crate) fn keys(&self) -> Vec<PackedId> {
        let keys: BTreeSet<PackedId> = self
            .exists
            .keys()
            .chain(self.info.keys())
            .chain(self.masks.keys())
            .copied()
            .collect();
        keys.into_iter().collect()
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    /// A batch that rebuilds this exact state from empty.
    pub(crate) fn to_batch(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for key in self.keys() {
            if let Some(&info) = self.info.get(&key) {
                batch.put_info(key, info);
            }
            if let Some(mask) = self.masks.get(&key) {
                batch.put_mask(key, mask.clone());
            }
            if let Some(&exists) = self.exists.get(&key) {
                batch.set_exists(key, exists);
            }
        }
        batch
    }
}
