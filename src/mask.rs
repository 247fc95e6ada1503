//! Binary cutout masks and their run-length encoding.
//!
//! Word masks are mostly long horizontal runs of background and ink, so a
//! run-length stream is a fraction of the raw bitmap's size. The cache stores
//! masks as opaque bytes; this module produces and reads those bytes.
//!
//! # Examples
//!
//! ```
//! use cutout_store::mask::{decode_rle, encode_rle, BinaryMask};
//!
//! let luma = [0, 0, 255, 255, 255, 0, 0, 0];
//! let mask = BinaryMask::from_luma(4, 2, &luma, 128).unwrap();
//! assert_eq!(mask.count_ones(), 3);
//!
//! let encoded = encode_rle(&mask);
//! assert_eq!(decode_rle(encoded).unwrap(), mask);
//! ```
//!
//! Stored masks may also be zlib-compressed with [`encode_rle_zlib`], which
//! shrinks the run stream further for large, regular masks.

mod bitmap;
mod error;
mod rle;

pub use bitmap::BinaryMask;
pub use error::MaskError;
pub use rle::{decode_rle, decode_rle_zlib, encode_rle, encode_rle_zlib, RLE_HEADER_LEN};

#[cfg(test)]
mod tests;
