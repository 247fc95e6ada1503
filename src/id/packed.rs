use std::fmt;

use crate::bitfield::CodecError;
use crate::constants::MAX_SAFE_BITS;

/// A packed identifier: an exact integer below `2^52`.
///
/// Storage layers that only support floating-point keys can hold it as an
/// `f64` without loss. Treat it as opaque: compare for equality or unpack it,
/// never do arithmetic on it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackedId(u64);

impl PackedId {
    /// Exclusive upper bound of every packed identifier.
    pub const LIMIT: u64 = 1 << MAX_SAFE_BITS;

    /// Wraps a raw key, or returns `None` if it is not below `2^52`.
    pub fn new(raw: u64) -> Option<Self> {
        (raw < Self::LIMIT).then_some(Self(raw))
    }

    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Converts to an `f64`; exact because the value is below `2^52`.
    pub fn to_f64(self) -> f64 {
        self.0 as f64
    }

    /// Recovers an identifier stored as a floating-point key.
    ///
    /// Rejects negative, fractional, non-finite and too-large values.
    pub fn try_from_f64(value: f64) -> Result<Self, CodecError> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= Self::LIMIT as f64
        {
            return Err(CodecError::NotSafeInteger(value));
        }
        Ok(Self(value as u64))
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for PackedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedId({:#015x})", self.0)
    }
}

impl fmt::Display for PackedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PackedId> for u64 {
    fn from(id: PackedId) -> Self {
        id.0
    }
}
