use thiserror::Error;

/// Errors produced while packing or unpacking bit fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A field value does not fit in its declared width.
    #[error("field {index}: value {value} does not fit in {width} bits")]
    OutOfRange { index: usize, value: u64, width: u32 },

    #[error("expected {expected} field values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("field {index}: width {width} exceeds 64 bits")]
    FieldTooWide { index: usize, width: u32 },

    /// The summed widths exceed what the target representation can hold.
    #[error("layout is {bits} bits wide, maximum is {max}")]
    LayoutTooWide { bits: u32, max: u32 },

    /// The packed value has bits set above the layout's total width.
    #[error("packed value {packed:#x} does not fit in {bits} bits")]
    PackedOutOfRange { packed: u128, bits: u32 },

    #[error("value {0} is not an exact safe integer")]
    NotSafeInteger(f64),
}
