//! Packed identifiers for word cutouts and pages.
//!
//! Each identifier type declares a [`BitLayout`] and converts itself to and
//! from its field tuple; packing and unpacking go through the layout.
//!
//! | Identifier | Layout (most significant first)                           | Bits |
//! |------------|-----------------------------------------------------------|------|
//! | [`WordId`] | surah:8, manuscript:12, word_number:16, part:4, page:12   | 52   |
//! | [`PageId`] | surah:8, manuscript:12, page:12                           | 32   |
//!
//! # Examples
//!
//! ```
//! use cutout_store::id::{Identifier, WordId};
//!
//! let word = WordId::new(2, 17, 255, 1, 42);
//! let packed = word.pack().unwrap();
//! assert!(packed.get() < 1 << 52);
//! assert_eq!(WordId::unpack(packed).unwrap(), word);
//!
//! // manuscript numbers only have 12 bits
//! assert!(WordId::new(2, 5000, 255, 1, 42).pack().is_err());
//! ```

mod packed;
mod page;
mod word;

pub use packed::PackedId;
pub use page::PageId;
pub use word::WordId;

use crate::bitfield::{BitLayout, CodecError};

/// A tuple of bounded fields with a fixed packed layout.
pub trait Identifier: Sized {
    const LAYOUT: BitLayout;

    /// Field values in layout order.
    fn fields(&self) -> Vec<u64>;

    fn from_fields(fields: &[u64]) -> Result<Self, CodecError>;

    fn pack(&self) -> Result<PackedId, CodecError> {
        Self::LAYOUT.pack(&self.fields())
    }

    fn unpack(id: PackedId) -> Result<Self, CodecError> {
        Self::from_fields(&Self::LAYOUT.unpack(id)?)
    }
}

fn exact_fields<const N: usize>(fields: &[u64]) -> Result<[u64; N], CodecError> {
    <[u64; N]>::try_from(fields).map_err(|_| CodecError::ArityMismatch {
        expected: N,
        actual: fields.len(),
    })
}

fn narrow<T: TryFrom<u64>>(index: usize, value: u64, width: u32) -> Result<T, CodecError> {
    let out_of_range = CodecError::OutOfRange {
        index,
        value,
        width,
    };
    if width < 64 && value >> width != 0 {
        return Err(out_of_range);
    }
    T::try_from(value).map_err(|_| out_of_range)
}
