use std::fmt;

use super::{Identifier, PageId};
use crate::bitfield::{BitField, BitLayout, CodecError};
use crate::constants::{MANUSCRIPT_BITS, PAGE_BITS, PART_BITS, SURAH_BITS, WORD_NUMBER_BITS};

/// Identifies one word cutout: a word (or one part of a split word) on a page
/// of a manuscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId {
    pub surah: u8,
    pub manuscript: u16,
    pub word_number: u16,
    pub part: u8,
    pub page: u16,
}

impl WordId {
    pub fn new(surah: u8, manuscript: u16, word_number: u16, part: u8, page: u16) -> Self {
        Self {
            surah,
            manuscript,
            word_number,
            part,
            page,
        }
    }

    /// The page this word sits on.
    pub fn page_id(&self) -> PageId {
        PageId::new(self.surah, self.manuscript, self.page)
    }
}

const WORD_FIELDS: &[BitField] = &[
    BitField::new("surah", SURAH_BITS),
    BitField::new("manuscript", MANUSCRIPT_BITS),
    BitField::new("word_number", WORD_NUMBER_BITS),
    BitField::new("part", PART_BITS),
    BitField::new("page", PAGE_BITS),
];

impl Identifier for WordId {
    const LAYOUT: BitLayout = BitLayout::from_static(WORD_FIELDS);

    fn fields(&self) -> Vec<u64> {
        vec![
            u64::from(self.surah),
            u64::from(self.manuscript),
            u64::from(self.word_number),
            u64::from(self.part),
            u64::from(self.page),
        ]
    }

    fn from_fields(fields: &[u64]) -> Result<Self, CodecError> {
        let [surah, manuscript, word_number, part, page] = super::exact_fields::<5>(fields)?;
        Ok(Self {
            surah: super::narrow(0, surah, SURAH_BITS)?,
            manuscript: super::narrow(1, manuscript, MANUSCRIPT_BITS)?,
            word_number: super::narrow(2, word_number, WORD_NUMBER_BITS)?,
            part: super::narrow(3, part, PART_BITS)?,
            page: super::narrow(4, page, PAGE_BITS)?,
        })
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}@{}",
            self.surah, self.manuscript, self.word_number, self.part, self.page
        )
    }
}
