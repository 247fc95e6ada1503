use bytes::{BufMut, Bytes, BytesMut};

use super::*;
use crate::constants::MAX_MASK_PIXELS;

fn header(width: u32, height: u32, initial: u8) -> BytesMut {
    let mut buf = BytesMut::new();
    buf.put_u32(width);
    buf.put_u32(height);
    buf.put_u8(initial);
    buf
}

#[test]
fn test_bitmap_set_get_clear() {
    let mut mask = BinaryMask::new(10, 3);
    assert_eq!(mask.len(), 30);
    assert_eq!(mask.as_bytes().len(), 4);

    mask.set(9, 2);
    mask.set(0, 0);
    assert!(mask.get(9, 2));
    assert!(mask.get(0, 0));
    assert!(!mask.get(1, 0));
    assert_eq!(mask.count_ones(), 2);

    mask.clear(9, 2);
    assert!(!mask.get(9, 2));

    // out of bounds is ignored
    mask.set(10, 0);
    assert!(!mask.get(10, 0));
    assert_eq!(mask.count_ones(), 1);
}

#[test]
fn test_from_luma_pixel_count() {
    let err = BinaryMask::from_luma(3, 3, &[0; 8], 128).unwrap_err();
    assert_eq!(
        err,
        MaskError::PixelCountMismatch {
            expected: 9,
            actual: 8
        }
    );
}

#[test]
fn test_encode_layout() {
    let mask = BinaryMask::from_luma(4, 2, &[255, 255, 0, 0, 0, 255, 255, 255], 128).unwrap();
    let encoded = encode_rle(&mask);

    let mut expected = header(4, 2, 1);
    expected.put_u16(2);
    expected.put_u16(3);
    expected.put_u16(3);
    assert_eq!(encoded, expected.freeze());
    assert_eq!(decode_rle(encoded).unwrap(), mask);
}

#[test]
fn test_long_runs_split() {
    let width = 70_000;
    let mut mask = BinaryMask::new(width, 1);
    mask.set(width - 1, 0);

    let encoded = encode_rle(&mask);
    // 69_999 clear pixels: 65_535, 0, 4_464; then one set pixel
    assert_eq!(encoded.len(), RLE_HEADER_LEN + 4 * 2);
    let decoded = decode_rle(encoded).unwrap();
    assert_eq!(decoded, mask);
    assert_eq!(decoded.count_ones(), 1);
}

#[test]
fn test_empty_mask() {
    let mask = BinaryMask::new(0, 5);
    assert!(mask.is_empty());
    let encoded = encode_rle(&mask);
    assert_eq!(encoded.len(), RLE_HEADER_LEN);
    assert_eq!(decode_rle(encoded).unwrap(), mask);
}

#[test]
fn test_decode_errors() {
    assert_eq!(
        decode_rle(Bytes::from_static(&[0, 0, 0, 1])),
        Err(MaskError::Truncated)
    );
    assert_eq!(
        decode_rle(header(1, 1, 2).freeze()),
        Err(MaskError::InvalidInitialValue(2))
    );

    let mut odd = header(1, 1, 0);
    odd.put_u8(1);
    assert_eq!(decode_rle(odd.freeze()), Err(MaskError::Truncated));

    let mut short = header(4, 4, 0);
    short.put_u16(10);
    assert_eq!(
        decode_rle(short.freeze()),
        Err(MaskError::LengthMismatch {
            expected: 16,
            actual: 10
        })
    );
}

#[test]
fn test_oversized_header_rejected_before_allocation() {
    let mut huge = header(65535, 65535, 0);
    huge.put_u16(u16::MAX);
    assert_eq!(
        decode_rle(huge.freeze()),
        Err(MaskError::TooLarge {
            pixels: 65535 * 65535,
            max: MAX_MASK_PIXELS,
        })
    );
}

#[test]
fn test_zlib_round_trip() {
    let mut mask = BinaryMask::new(300, 120);
    for y in 20..100 {
        for x in (y % 7)..280 {
            if x % 11 < 6 {
                mask.set(x, y);
            }
        }
    }

    let plain = encode_rle(&mask);
    let compressed = encode_rle_zlib(&mask).unwrap();
    assert!(compressed.len() < plain.len());
    assert_eq!(decode_rle_zlib(&compressed).unwrap(), mask);

    let empty = BinaryMask::new(0, 0);
    assert_eq!(
        decode_rle_zlib(&encode_rle_zlib(&empty).unwrap()).unwrap(),
        empty
    );
}

#[test]
fn test_zlib_corrupt_input() {
    assert!(matches!(
        decode_rle_zlib(b"definitely not zlib"),
        Err(MaskError::Compression(_))
    ));

    let mask = BinaryMask::from_luma(4, 1, &[0, 255, 255, 0], 128).unwrap();
    let compressed = encode_rle_zlib(&mask).unwrap();
    // too little of the stream to reach the end of the header
    assert!(decode_rle_zlib(&compressed[..4]).is_err());

    // valid zlib around an invalid run stream
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    std::io::Write::write_all(&mut encoder, &header(2, 2, 7)).unwrap();
    let wrapped = encoder.finish().unwrap();
    assert_eq!(
        decode_rle_zlib(&wrapped),
        Err(MaskError::InvalidInitialValue(7))
    );
}
