use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    #[error("mask data truncated")]
    Truncated,

    #[error("invalid initial run value: {0}")]
    InvalidInitialValue(u8),

    /// The runs do not cover exactly `width * height` pixels.
    #[error("runs cover {actual} pixels, mask has {expected}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("expected {expected} pixels, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },

    /// The header declares more pixels than any mask may have.
    #[error("mask of {pixels} pixels exceeds limit of {max}")]
    TooLarge { pixels: u64, max: u64 },

    #[error("zlib stream error: {0}")]
    Compression(String),
}
