use std::fmt;

use super::Identifier;
use crate::bitfield::{BitField, BitLayout, CodecError};
use crate::constants::{MANUSCRIPT_BITS, PAGE_BITS, SURAH_BITS};

/// Identifies one page of a manuscript within a surah.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub surah: u8,
    pub manuscript: u16,
    pub page: u16,
}

impl PageId {
    pub fn new(surah: u8, manuscript: u16, page: u16) -> Self {
        Self {
            surah,
            manuscript,
            page,
        }
    }
}

const PAGE_FIELDS: &[BitField] = &[
    BitField::new("surah", SURAH_BITS),
    BitField::new("manuscript", MANUSCRIPT_BITS),
    BitField::new("page", PAGE_BITS),
];

impl Identifier for PageId {
    const LAYOUT: BitLayout = BitLayout::from_static(PAGE_FIELDS);

    fn fields(&self) -> Vec<u64> {
        vec![
            u64::from(self.surah),
            u64::from(self.manuscript),
            u64::from(self.page),
        ]
    }

    fn from_fields(fields: &[u64]) -> Result<Self, CodecError> {
        let [surah, manuscript, page] = super::exact_fields::<3>(fields)?;
        Ok(Self {
            surah: super::narrow(0, surah, SURAH_BITS)?,
            manuscript: super::narrow(1, manuscript, MANUSCRIPT_BITS)?,
            page: super::narrow(2, page, PAGE_BITS)?,
        })
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.surah, self.manuscript, self.page)
    }
}
