// src/engine/orientation.rs
//
// EXIF orientation tag -> rotation angle.

use crate::engine::decoder::{SourceImage, ORIENTATION_TAG};

/// Rotation needed to display the image upright.
///
/// Only the pure-rotation EXIF values map to an angle. Mirrored variants
/// (2, 4, 5, 7) combine a rotation with a flip and are intentionally
/// unsupported; they map to `D0` like any other unrecognized value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Angle {
    #[default]
    D0,
    D90,
    D180,
    D270,
}

impl Angle {
    /// Read the orientation tag from the image metadata. Absent or
    /// unparseable tags mean "already upright". Pure function of metadata.
    pub fn from_metadata(source: &SourceImage) -> Self {
        match source.tag(ORIENTATION_TAG) {
            Some(value) => Self::from_tag_value(value),
            None => Self::D0,
        }
    }

    /// Map an orientation tag string by prefix: "6" -> 90, "8" -> 270,
    /// "3" -> 180, everything else -> 0.
    pub fn from_tag_value(value: &str) -> Self {
        if value.starts_with('6') {
            Self::D90
        } else if value.starts_with('8') {
            Self::D270
        } else if value.starts_with('3') {
            Self::D180
        } else {
            Self::D0
        }
    }

    /// True for the angles that swap width and height.
    pub fn transposes(self) -> bool {
        matches!(self, Self::D90 | Self::D270)
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::D0 => 0,
            Self::D90 => 90,
            Self::D180 => 180,
            Self::D270 => 270,
        }
    }
}
