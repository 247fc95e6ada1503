use std::borrow::Cow;

use super::codec::{pack_with, total_width, unpack_with};
use super::error::CodecError;
use crate::constants::MAX_SAFE_BITS;
use crate::id::PackedId;

/// One named field of a [`BitLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    name: Cow<'static, str>,
    width: u32,
}

impl BitField {
    pub const fn new(name: &'static str, width: u32) -> Self {
        Self {
            name: Cow::Borrowed(name),
            width,
        }
    }

    pub fn owned(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            width,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Largest value this field can hold.
    pub fn max_value(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }
}

/// An ordered set of fields whose packed value is always a safe integer.
///
/// The first field occupies the most significant bits. The total width never
/// exceeds [`MAX_SAFE_BITS`], so every packed value survives a round trip
/// through an `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitLayout {
    fields: Cow<'static, [BitField]>,
    total_bits: u32,
}

impl BitLayout {
    /// Builds a layout at compile time.
    ///
    /// # Panics
    ///
    /// Panics (during const evaluation for `const` items) if the widths sum to
    /// more than 52 bits.
    pub const fn from_static(fields: &'static [BitField]) -> Self {
        let mut total = 0u32;
        let mut i = 0;
        while i < fields.len() {
            total += fields[i].width;
            i += 1;
        }
        assert!(total <= MAX_SAFE_BITS, "bit layout wider than 52 bits");
        Self {
            fields: Cow::Borrowed(fields),
            total_bits: total,
        }
    }

    /// Builds a layout at run time.
    pub fn new(fields: Vec<BitField>) -> Result<Self, CodecError> {
        let total_bits = total_width(fields.iter().map(BitField::width))?;
        if total_bits > MAX_SAFE_BITS {
            return Err(CodecError::LayoutTooWide {
                bits: total_bits,
                max: MAX_SAFE_BITS,
            });
        }
        Ok(Self {
            fields: Cow::Owned(fields),
            total_bits,
        })
    }

    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub fn widths(&self) -> Vec<u32> {
        self.fields.iter().map(BitField::width).collect()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn max_value(&self, index: usize) -> Option<u64> {
        self.fields.get(index).map(BitField::max_value)
    }

    /// Packs one value per field into a [`PackedId`].
    pub fn pack(&self, values: &[u64]) -> Result<PackedId, CodecError> {
        let packed = pack_with(values, self.fields.iter().map(BitField::width))?;
        // total_bits <= 52, so the value fits in a u64 and below 2^52
        Ok(PackedId::from_raw(packed as u64))
    }

    /// Recovers the field values of `id`, in declaration order.
    pub fn unpack(&self, id: PackedId) -> Result<Vec<u64>, CodecError> {
        unpack_with(
            u128::from(id.get()),
            self.fields.iter().map(BitField::width),
        )
    }
}
