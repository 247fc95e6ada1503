use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::bitmap::BinaryMask;
use super::error::MaskError;
use crate::constants::{MAX_MASK_PIXELS, RLE_ZLIB_LEVEL};

/// `u32` width, `u32` height, `u8` initial value.
pub const RLE_HEADER_LEN: usize = 9;

/// Longest run-length stream a mask within [`MAX_MASK_PIXELS`] can encode to:
/// at most one run per pixel, plus the split markers of long runs.
const MAX_RLE_STREAM_LEN: usize = RLE_HEADER_LEN
    + 2 * MAX_MASK_PIXELS as usize
    + 4 * (MAX_MASK_PIXELS as usize / u16::MAX as usize + 1);

fn put_run(buf: &mut BytesMut, mut run: usize) {
    let max = usize::from(u16::MAX);
    while run > max {
        buf.put_u16(u16::MAX);
        // a zero-length run of the other value keeps the alternation intact
        buf.put_u16(0);
        run -= max;
    }
    buf.put_u16(run as u16);
}

/// Run-length encodes a mask.
///
/// After the header come big-endian `u16` run lengths of alternating pixel
/// values, starting with the initial value.
pub fn encode_rle(mask: &BinaryMask) -> Bytes {
    let mut buf = BytesMut::with_capacity(RLE_HEADER_LEN + 64);
    buf.put_u32(mask.width());
    buf.put_u32(mask.height());

    let initial = mask.get_index(0);
    buf.put_u8(u8::from(initial));

    let mut current = initial;
    let mut run = 0usize;
    for index in 0..mask.len() {
        let bit = mask.get_index(index);
        if bit != current {
            put_run(&mut buf, run);
            current = bit;
            run = 0;
        }
        run += 1;
    }
    if run > 0 {
        put_run(&mut buf, run);
    }

    buf.freeze()
}

/// Decodes a mask produced by [`encode_rle`].
pub fn decode_rle(mut data: Bytes) -> Result<BinaryMask, MaskError> {
    if data.remaining() < RLE_HEADER_LEN {
        return Err(MaskError::Truncated);
    }
    let width = data.get_u32();
    let height = data.get_u32();
    let initial = match data.get_u8() {
        0 => false,
        1 => true,
        other => return Err(MaskError::InvalidInitialValue(other)),
    };
    if data.remaining() % 2 != 0 {
        return Err(MaskError::Truncated);
    }

    let expected = u64::from(width) * u64::from(height);
    if expected > MAX_MASK_PIXELS {
        return Err(MaskError::TooLarge {
            pixels: expected,
            max: MAX_MASK_PIXELS,
        });
    }
    let covered: u64 = data
        .chunks_exact(2)
        .map(|c| u64::from(u16::from_be_bytes([c[0], c[1]])))
        .sum();
    if covered != expected {
        return Err(MaskError::LengthMismatch {
            expected,
            actual: covered,
        });
    }

    let mut mask = BinaryMask::new(width, height);
    let mut value = initial;
    let mut index = 0usize;
    while data.has_remaining() {
        let run = usize::from(data.get_u16());
        if value {
            for i in index..index + run {
                mask.set_index(i);
            }
        }
        index += run;
        value = !value;
    }
    Ok(mask)
}

/// Run-length encodes a mask and zlib-compresses the stream.
pub fn encode_rle_zlib(mask: &BinaryMask) -> Result<Bytes, MaskError> {
    let rle = encode_rle(mask);
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(rle.len() / 2),
        Compression::new(RLE_ZLIB_LEVEL),
    );
    encoder
        .write_all(&rle)
        .map_err(|e| MaskError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| MaskError::Compression(e.to_string()))?;
    Ok(Bytes::from(compressed))
}

/// Decodes a mask produced by [`encode_rle_zlib`].
///
/// Inflation stops once the output exceeds the longest stream a valid mask
/// can produce.
pub fn decode_rle_zlib(data: &[u8]) -> Result<BinaryMask, MaskError> {
    let mut rle = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_RLE_STREAM_LEN as u64 + 1)
        .read_to_end(&mut rle)
        .map_err(|e| MaskError::Compression(e.to_string()))?;
    if rle.len() > MAX_RLE_STREAM_LEN {
        return Err(MaskError::Compression(
            "inflated stream longer than any valid mask".into(),
        ));
    }
    decode_rle(Bytes::from(rle))
}
