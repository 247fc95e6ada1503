use std::fmt;

use bytes::Bytes;

/// The three record spaces kept per identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordSpace {
    Exists = 0,
    Info = 1,
    Mask = 2,
}

impl RecordSpace {
    pub const ALL: [RecordSpace; 3] = [RecordSpace::Exists, RecordSpace::Info, RecordSpace::Mask];
}

impl TryFrom<u8> for RecordSpace {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RecordSpace::Exists),
            1 => Ok(RecordSpace::Info),
            2 => Ok(RecordSpace::Mask),
            other => Err(other),
        }
    }
}

impl fmt::Display for RecordSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordSpace::Exists => "exists",
            RecordSpace::Info => "info",
            RecordSpace::Mask => "mask",
        };
        f.write_str(name)
    }
}

/// Pixel rectangle of a cutout within its page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Metadata stored for a cutout.
///
/// The baselines are fractions of the box height, measured from its top edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CutoutInfo {
    pub bbox: BoundingBox,
    pub baseline_y0: Option<f32>,
    pub baseline_y1: Option<f32>,
}

impl CutoutInfo {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            baseline_y0: None,
            baseline_y1: None,
        }
    }

    pub fn with_baseline(mut self, y0: f32, y1: f32) -> Self {
        self.baseline_y0 = Some(y0);
        self.baseline_y1 = Some(y1);
        self
    }

    /// Returns a description of the first problem found, if any.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.bbox.width == 0 || self.bbox.height == 0 {
            return Err("bounding box is empty");
        }
        for baseline in [self.baseline_y0, self.baseline_y1].into_iter().flatten() {
            if !(0.0..=1.0).contains(&baseline) {
                return Err("baseline outside [0, 1]");
            }
        }
        Ok(())
    }
}

/// All three record spaces of one identifier, read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub exists: Option<bool>,
    pub info: Option<CutoutInfo>,
    pub mask: Option<Bytes>,
}

impl Snapshot {
    pub fn is_vacant(&self) -> bool {
        self.exists.is_none() && self.info.is_none() && self.mask.is_none()
    }
}
