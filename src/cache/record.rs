use bytes::Bytes;

use crate::id::PackedId;
use crate::mask::{decode_rle, BinaryMask, MaskError};
use crate::storage::CutoutInfo;

/// A complete cutout: metadata plus its mask payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoutRecord {
    pub info: CutoutInfo,
    pub mask: Bytes,
}

impl CutoutRecord {
    pub fn new(info: CutoutInfo, mask: Bytes) -> Self {
        Self { info, mask }
    }

    /// Decodes a run-length encoded mask payload.
    pub fn decode_mask(&self) -> Result<BinaryMask, MaskError> {
        decode_rle(self.mask.clone())
    }
}

/// What the cache knows about one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The cutout is stored locally, info and mask together.
    FullyPresent(CutoutRecord),
    /// The remote authority said this identifier does not exist.
    KnownAbsent,
    /// Nothing reliable is stored; ask the remote authority.
    Unknown,
}

impl Lookup {
    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::FullyPresent(_))
    }

    pub fn is_known_absent(&self) -> bool {
        matches!(self, Lookup::KnownAbsent)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Lookup::Unknown)
    }

    pub fn into_record(self) -> Option<CutoutRecord> {
        match self {
            Lookup::FullyPresent(record) => Some(record),
            Lookup::KnownAbsent | Lookup::Unknown => None,
        }
    }
}

/// An identifier flagged as existing whose payload is incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inconsistency {
    pub key: PackedId,
    pub has_info: bool,
    pub has_mask: bool,
}
