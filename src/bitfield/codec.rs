use super::error::CodecError;
use crate::constants::{MAX_CODEC_BITS, MAX_FIELD_BITS};

#[inline]
fn low_mask(width: u32) -> u128 {
    (1u128 << width) - 1
}

/// Validates every width and returns the layout's total width.
pub(crate) fn total_width<I>(widths: I) -> Result<u32, CodecError>
where
    I: Iterator<Item = u32>,
{
    let mut total: u32 = 0;
    for (index, width) in widths.enumerate() {
        if width > MAX_FIELD_BITS {
            return Err(CodecError::FieldTooWide { index, width });
        }
        total = total.saturating_add(width);
    }
    if total > MAX_CODEC_BITS {
        return Err(CodecError::LayoutTooWide {
            bits: total,
            max: MAX_CODEC_BITS,
        });
    }
    Ok(total)
}

pub(crate) fn pack_with<I>(fields: &[u64], widths: I) -> Result<u128, CodecError>
where
    I: ExactSizeIterator<Item = u32> + Clone,
{
    if fields.len() != widths.len() {
        return Err(CodecError::ArityMismatch {
            expected: widths.len(),
            actual: fields.len(),
        });
    }
    total_width(widths.clone())?;

    let mut packed: u128 = 0;
    for (index, (&value, width)) in fields.iter().zip(widths).enumerate() {
        if u128::from(value) > low_mask(width) {
            return Err(CodecError::OutOfRange {
                index,
                value,
                width,
            });
        }
        packed = (packed << width) | u128::from(value);
    }
    Ok(packed)
}

pub(crate) fn unpack_with<I>(packed: u128, widths: I) -> Result<Vec<u64>, CodecError>
where
    I: ExactSizeIterator<Item = u32> + DoubleEndedIterator + Clone,
{
    let bits = total_width(widths.clone())?;
    if bits < MAX_CODEC_BITS && packed >> bits != 0 {
        return Err(CodecError::PackedOutOfRange { packed, bits });
    }

    let mut remaining = packed;
    let mut fields = Vec::with_capacity(widths.len());
    for width in widths.rev() {
        fields.push((remaining & low_mask(width)) as u64);
        remaining >>= width;
    }
    fields.reverse();
    Ok(fields)
}

/// Packs `fields` into a single integer, `fields[0]` in the highest bits.
///
/// `widths[i]` is the number of bits reserved for `fields[i]`. A value that
/// does not fit its width is rejected with [`CodecError::OutOfRange`]; values
/// are never truncated.
///
/// # Errors
///
/// Fails if the slices differ in length, a width exceeds 64 bits, the widths
/// sum to more than 128 bits, or a value is out of range.
pub fn pack(fields: &[u64], widths: &[u32]) -> Result<u128, CodecError> {
    pack_with(fields, widths.iter().copied())
}

/// Splits `packed` back into its fields, in the same order they were packed.
///
/// The least significant field is extracted first and the result reversed, so
/// `unpack(pack(t, w)?, w)? == t` for every in-range tuple `t`.
///
/// # Errors
///
/// Fails if the widths are invalid or `packed` has bits set above their sum.
pub fn unpack(packed: u128, widths: &[u32]) -> Result<Vec<u64>, CodecError> {
    unpack_with(packed, widths.iter().copied())
}
