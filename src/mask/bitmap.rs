use super::error::MaskError;

/// A one-bit-per-pixel cutout mask, stored row-major.
///
/// Pixels are numbered from the high bit of the first byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    bits: Vec<u8>,
    width: u32,
    height: u32,
}

impl BinaryMask {
    /// Creates an all-clear mask.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            bits: vec![0; len.div_ceil(8)],
            width,
            height,
        }
    }

    /// Thresholds an 8-bit grayscale image: pixels `>= threshold` are set.
    pub fn from_luma(
        width: u32,
        height: u32,
        pixels: &[u8],
        threshold: u8,
    ) -> Result<Self, MaskError> {
        let mut mask = Self::new(width, height);
        if pixels.len() != mask.len() {
            return Err(MaskError::PixelCountMismatch {
                expected: mask.len(),
                actual: pixels.len(),
            });
        }
        for (index, &luma) in pixels.iter().enumerate() {
            if luma >= threshold {
                mask.set_index(index);
            }
        }
        Ok(mask)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.get_index(self.index(x, y))
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            self.set_index(self.index(x, y));
        }
    }

    pub fn clear(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.bits[index / 8] &= !(1 << (7 - index % 8));
        }
    }

    pub fn get_index(&self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        (self.bits[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        if index < self.len() {
            self.bits[index / 8] |= 1 << (7 - index % 8);
        }
    }

    /// Number of set pixels.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
