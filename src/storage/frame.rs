//! Journal frame encoding.
//!
//! ```text
//! frame   := len:u32 | sha1(payload):[u8; 20] | payload
//! payload := count:u32 | op*
//! op      := tag:u8 | key:u64 | body
//! ```
//!
//! | tag | op        | body                                              |
//! |-----|-----------|---------------------------------------------------|
//! | 1   | PutInfo   | x, y, width, height: u32, flags: u8, [y0: f32], [y1: f32] |
//! | 2   | PutMask   | len: u32, bytes                                   |
//! | 3   | SetExists | u8                                                |
//! | 4   | Remove    | space: u8                                         |

use bytes::{Buf, BufMut, Bytes, BytesMut};
use sha1::{Digest, Sha1};

use super::batch::{WriteBatch, WriteOp};
use super::error::StorageError;
use super::record::{BoundingBox, CutoutInfo, RecordSpace};
use crate::constants::{FRAME_HEADER_LEN, MAX_FRAME_LEN};
use crate::id::PackedId;

const TAG_PUT_INFO: u8 = 1;
const TAG_PUT_MASK: u8 = 2;
const TAG_SET_EXISTS: u8 = 3;
const TAG_REMOVE: u8 = 4;

const HAS_Y0: u8 = 0x01;
const HAS_Y1: u8 = 0x02;

/// Why a frame could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrameError {
    /// The frame is cut short or fails its checksum: a write that never
    /// completed.
    Torn(&'static str),
    /// The frame is intact but its contents are not a valid batch.
    Invalid(String),
}

/// Encoded size of one op.
fn op_len(op: &WriteOp) -> usize {
    let body = match op {
        WriteOp::PutInfo { info, .. } => {
            17 + 4 * (usize::from(info.baseline_y0.is_some())
                + usize::from(info.baseline_y1.is_some()))
        }
        WriteOp::PutMask { mask, .. } => 4usize.saturating_add(mask.len()),
        WriteOp::SetExists { .. } | WriteOp::Remove { .. } => 1,
    };
    body.saturating_add(1 + 8)
}

/// Encoded size of a batch's payload, without the frame header.
pub(crate) fn payload_len(batch: &WriteBatch) -> usize {
    batch
        .ops()
        .iter()
        .fold(4, |len, op| len.saturating_add(op_len(op)))
}

/// Encodes `batch` as one frame whose payload is at most `max_len` bytes.
///
/// `max_len` is capped at [`MAX_FRAME_LEN`], the largest frame replay accepts.
pub(crate) fn encode_frame(batch: &WriteBatch, max_len: usize) -> Result<Bytes, StorageError> {
    let max = max_len.min(MAX_FRAME_LEN);
    let len = payload_len(batch);
    if len > max {
        return Err(StorageError::FrameTooLarge { len, max });
    }

    // Every count and length written below is at most `len`, so fits in a u32.
    let payload = encode_payload(batch, len);
    debug_assert_eq!(payload.len(), len);
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + len);
    buf.put_u32(len as u32);
    buf.put_slice(&Sha1::digest(&payload));
    buf.put_slice(&payload);
    Ok(buf.freeze())
}

/// Splits `batch` into consecutive batches that each encode within `max_len`.
///
/// An op too large on its own ends up alone in its batch, where
/// [`encode_frame`] rejects it.
pub(crate) fn split_batch(batch: WriteBatch, max_len: usize) -> Vec<WriteBatch> {
    let mut parts = Vec::new();
    let mut current = WriteBatch::new();
    let mut len = payload_len(&current);

    for op in batch.into_ops() {
        let op_len = op_len(&op);
        if !current.is_empty() && len.saturating_add(op_len) > max_len {
            parts.push(std::mem::take(&mut current));
            len = payload_len(&current);
        }
        len = len.saturating_add(op_len);
        current.push(op);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn encode_payload(batch: &WriteBatch, len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(len);
    buf.put_u32(batch.len() as u32);
    for op in batch.ops() {
        match op {
            WriteOp::PutInfo { key, info } => {
                buf.put_u8(TAG_PUT_INFO);
                buf.put_u64(key.get());
                buf.put_u32(info.bbox.x);
                buf.put_u32(info.bbox.y);
                buf.put_u32(info.bbox.width);
                buf.put_u32(info.bbox.height);
                let mut flags = 0;
                if info.baseline_y0.is_some() {
                    flags |= HAS_Y0;
                }
                if info.baseline_y1.is_some() {
                    flags |= HAS_Y1;
                }
                buf.put_u8(flags);
                if let Some(y0) = info.baseline_y0 {
                    buf.put_f32(y0);
                }
                if let Some(y1) = info.baseline_y1 {
                    buf.put_f32(y1);
                }
            }
            WriteOp::PutMask { key, mask } => {
                buf.put_u8(TAG_PUT_MASK);
                buf.put_u64(key.get());
                buf.put_u32(mask.len() as u32);
                buf.put_slice(mask);
            }
            WriteOp::SetExists { key, exists } => {
                buf.put_u8(TAG_SET_EXISTS);
                buf.put_u64(key.get());
                buf.put_u8(u8::from(*exists));
            }
            WriteOp::Remove { key, space } => {
                buf.put_u8(TAG_REMOVE);
                buf.put_u64(key.get());
                buf.put_u8(*space as u8);
            }
        }
    }
    buf.freeze()
}

/// Reads the frame at the start of `data`.
///
/// Returns the batch and the number of bytes the frame occupies. A frame whose
/// length prefix exceeds `max_len` is torn only if the data ends before the
/// prefixed length; a complete one is invalid, so replay never truncates it.
pub(crate) fn decode_frame(
    data: &Bytes,
    max_len: usize,
) -> Result<(WriteBatch, usize), FrameError> {
    if data.len() < FRAME_HEADER_LEN {
        return Err(FrameError::Torn("incomplete header"));
    }
    let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let end = FRAME_HEADER_LEN + len;
    if data.len() < end {
        return Err(FrameError::Torn("incomplete payload"));
    }
    if len > max_len {
        return Err(FrameError::Invalid(format!(
            "frame payload of {len} bytes exceeds limit of {max_len}"
        )));
    }

    let payload = data.slice(FRAME_HEADER_LEN..end);
    if Sha1::digest(&payload).as_slice() != &data[4..FRAME_HEADER_LEN] {
        return Err(FrameError::Torn("checksum mismatch"));
    }

    let batch = decode_payload(payload).map_err(|e| FrameError::Invalid(e.to_string()))?;
    Ok((batch, end))
}

fn need(data: &Bytes, n: usize, what: &'static str) -> Result<(), &'static str> {
    if data.remaining() < n {
        Err(what)
    } else {
        Ok(())
    }
}

fn decode_key(data: &mut Bytes) -> Result<PackedId, &'static str> {
    need(data, 8, "key truncated")?;
    PackedId::new(data.get_u64()).ok_or("key outside the 52-bit range")
}

fn decode_payload(mut data: Bytes) -> Result<WriteBatch, &'static str> {
    need(&data, 4, "op count truncated")?;
    let count = data.get_u32() as usize;
    let mut batch = WriteBatch::with_capacity(count.min(1024));

    for _ in 0..count {
        need(&data, 1, "op tag truncated")?;
        let tag = data.get_u8();
        let key = decode_key(&mut data)?;
        match tag {
            TAG_PUT_INFO => {
                need(&data, 17, "info truncated")?;
                let bbox = BoundingBox::new(
                    data.get_u32(),
                    data.get_u32(),
                    data.get_u32(),
                    data.get_u32(),
                );
                let flags = data.get_u8();
                let mut info = CutoutInfo::new(bbox);
                if flags & HAS_Y0 != 0 {
                    need(&data, 4, "baseline truncated")?;
                    info.baseline_y0 = Some(data.get_f32());
                }
                if flags & HAS_Y1 != 0 {
                    need(&data, 4, "baseline truncated")?;
                    info.baseline_y1 = Some(data.get_f32());
                }
                batch.put_info(key, info);
            }
            TAG_PUT_MASK => {
                need(&data, 4, "mask length truncated")?;
                let len = data.get_u32() as usize;
                need(&data, len, "mask truncated")?;
                batch.put_mask(key, data.split_to(len));
            }
            TAG_SET_EXISTS => {
                need(&data, 1, "exists flag truncated")?;
                let exists = match data.get_u8() {
                    0 => false,
                    1 => true,
                    _ => return Err("invalid exists flag"),
                };
                batch.set_exists(key, exists);
            }
            TAG_REMOVE => {
                need(&data, 1, "space truncated")?;
                let space =
                    RecordSpace::try_from(data.get_u8()).map_err(|_| "invalid record space")?;
                batch.remove(key, space);
            }
            _ => return Err("unknown op tag"),
        }
    }

    if data.has_remaining() {
        return Err("trailing bytes after ops");
    }
    Ok(batch)
}
