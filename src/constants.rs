//! Layout widths, storage limits and defaults.
//!
//! Identifier layouts are fixed by the manuscript numbering scheme: surahs fit
//! in 8 bits, manuscripts and pages in 12, word numbers in 16 and word parts in 4.

// ============================================================================
// Packed identifiers
// ============================================================================

/// Largest total layout width whose packed value is still an exact integer in
/// an IEEE-754 double (52 mantissa bits).
pub const MAX_SAFE_BITS: u32 = 52;

/// Widest layout the generic codec accepts (width of its accumulator).
pub const MAX_CODEC_BITS: u32 = 128;

/// Widest single field; unpacked values are returned as `u64`.
pub const MAX_FIELD_BITS: u32 = 64;

pub const SURAH_BITS: u32 = 8;
pub const MANUSCRIPT_BITS: u32 = 12;
pub const WORD_NUMBER_BITS: u32 = 16;
pub const PART_BITS: u32 = 4;
pub const PAGE_BITS: u32 = 12;

// ============================================================================
// Storage
// ============================================================================

/// Name of the append-only journal inside the cache directory.
pub const JOURNAL_FILE_NAME: &str = "cutouts.journal";

/// Temporary file used while compacting the journal.
pub const JOURNAL_COMPACT_FILE_NAME: &str = "cutouts.journal.compact";

/// Default payload quota: 512 MiB of info records and mask bytes.
pub const DEFAULT_QUOTA_BYTES: usize = 512 * 1024 * 1024;

/// Largest accepted mask payload. A full-page mask at 4096x4096 with one bit
/// per pixel is 2 MiB; run-length encoded masks are far smaller.
pub const DEFAULT_MAX_MASK_LEN: usize = 4 * 1024 * 1024;

/// Upper bound on one journal frame payload. Batches that would encode larger
/// are refused, and compaction splits the image into frames of at most this
/// size. A configured limit can only lower it.
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

/// Frame header: `u32` payload length followed by a SHA-1 digest.
pub const FRAME_HEADER_LEN: usize = 4 + 20;

/// Largest mask, in pixels, that a run-length stream may declare: 8192x8192.
pub const MAX_MASK_PIXELS: u64 = 1 << 26;

/// zlib level used for compressed run-length masks.
pub const RLE_ZLIB_LEVEL: u32 = 9;

/// Bytes charged against the quota for one stored info record.
pub const INFO_RECORD_COST: usize = 32;
