//! Fixed-width bit-field codec.
//!
//! Packs an ordered tuple of bounded unsigned integers into one integer by
//! concatenating their bits, and splits such an integer back into the tuple.
//!
//! # Bit layout
//!
//! The first field lands in the most significant bits and the last field in
//! the least significant bits. For widths `[12, 12, 8, 4]` and values
//! `[100, 3000, 233, 15]`:
//!
//! | field | width | value | bits           |
//! |-------|-------|-------|----------------|
//! | 0     | 12    | 100   | `000001100100` |
//! | 1     | 12    | 3000  | `101110111000` |
//! | 2     | 8     | 233   | `11101001`     |
//! | 3     | 4     | 15    | `1111`         |
//!
//! # Range policy
//!
//! Values that do not fit their width are rejected with
//! [`CodecError::OutOfRange`]. Truncating them would silently map two distinct
//! identifiers onto the same key.
//!
//! # Examples
//!
//! ```
//! use cutout_store::bitfield::{pack, unpack};
//!
//! let widths = [4, 8, 12, 12];
//! let packed = pack(&[15, 233, 3000, 100], &widths).unwrap();
//! assert_eq!(unpack(packed, &widths).unwrap(), vec![15, 233, 3000, 100]);
//!
//! assert!(pack(&[16, 0, 0, 0], &widths).is_err());
//! ```
//!
//! Layouts used as storage keys go through [`BitLayout`], which caps the total
//! width at 52 bits so the packed value stays exact in an `f64`:
//!
//! ```
//! use cutout_store::bitfield::{BitField, BitLayout};
//!
//! const FIELDS: &[BitField] = &[BitField::new("surah", 8), BitField::new("page", 12)];
//! const LAYOUT: BitLayout = BitLayout::from_static(FIELDS);
//!
//! let id = LAYOUT.pack(&[2, 7]).unwrap();
//! assert_eq!(id.get(), (2 << 12) | 7);
//! assert_eq!(LAYOUT.unpack(id).unwrap(), vec![2, 7]);
//! ```

mod codec;
mod error;
mod layout;

pub use codec::{pack, unpack};
pub use error::CodecError;
pub use layout::{BitField, BitLayout};
