use std::collections::HashSet;

use bytes::Bytes;

use super::record::{CutoutInfo, RecordSpace};
use crate::id::PackedId;

/// One write against a single record space.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    PutInfo { key: PackedId, info: CutoutInfo },
    PutMask { key: PackedId, mask: Bytes },
    SetExists { key: PackedId, exists: bool },
    Remove { key: PackedId, space: RecordSpace },
}

impl WriteOp {
    pub fn key(&self) -> PackedId {
        match self {
            WriteOp::PutInfo { key, .. }
            | WriteOp::PutMask { key, .. }
            | WriteOp::SetExists { key, .. }
            | WriteOp::Remove { key, .. } => *key,
        }
    }

    pub fn space(&self) -> RecordSpace {
        match self {
            WriteOp::PutInfo { .. } => RecordSpace::Info,
            WriteOp::PutMask { .. } => RecordSpace::Mask,
            WriteOp::SetExists { .. } => RecordSpace::Exists,
            WriteOp::Remove { space, .. } => *space,
        }
    }
}

/// An ordered group of writes that a backend applies all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn put_info(&mut self, key: PackedId, info: CutoutInfo) {
        self.push(WriteOp::PutInfo { key, info });
    }

    pub fn put_mask(&mut self, key: PackedId, mask: Bytes) {
        self.push(WriteOp::PutMask { key, mask });
    }

    pub fn set_exists(&mut self, key: PackedId, exists: bool) {
        self.push(WriteOp::SetExists { key, exists });
    }

    pub fn remove(&mut self, key: PackedId, space: RecordSpace) {
        self.push(WriteOp::Remove { key, space });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Distinct identifiers touched by the batch, in first-seen order.
    pub fn keys(&self) -> Vec<PackedId> {
        let mut seen = HashSet::new();
        self.ops
            .iter()
            .map(WriteOp::key)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// Mask bytes carried by the batch.
    pub fn payload_bytes(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                WriteOp::PutMask { mask, .. } => mask.len(),
                _ => 0,
            })
            .sum()
    }
}
