//! Orientation transforms
//!
//! Lossless quarter-turn rotations used for the secondary recognition pass
//! and for annotating in the frame that pass saw. Rotations are
//! counter-clockwise and expand the frame (width and height swap on odd
//! quarter turns), so no pixel is ever cropped.

use image::{imageops, ImageBuffer, Pixel};

use crate::ocr::Coordinates;

/// Counter-clockwise quarter-turn rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    /// Rotation used for the secondary OCR pass
    pub const SECONDARY_PASS: Rotation = Rotation::Ccw90;

    #[cfg(test)]
    const ALL: [Rotation; 4] = [Self::None, Self::Ccw90, Self::Ccw180, Self::Ccw270];

    pub fn degrees(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Ccw90 => 90,
            Self::Ccw180 => 180,
            Self::Ccw270 => 270,
        }
    }

    pub fn inverse(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Ccw90 => Self::Ccw270,
            Self::Ccw180 => Self::Ccw180,
            Self::Ccw270 => Self::Ccw90,
        }
    }

    /// Dimensions of the rotated frame for an input of `(width, height)`
    pub fn rotated_size(&self, (width, height): (u32, u32)) -> (u32, u32) {
        match self {
            Self::None | Self::Ccw180 => (width, height),
            Self::Ccw90 | Self::Ccw270 => (height, width),
        }
    }

    /// Map a point of an image sized `original` into the rotated frame
    pub fn to_rotated(&self, point: Coordinates, original: (u32, u32)) -> Coordinates {
        let (w, h) = (original.0 as i32, original.1 as i32);
        let Coordinates { x, y } = point;
        match self {
            Self::None => point,
            Self::Ccw90 => Coordinates { x: y, y: w - 1 - x },
            Self::Ccw180 => Coordinates {
                x: w - 1 - x,
                y: h - 1 - y,
            },
            Self::Ccw270 => Coordinates { x: h - 1 - y, y: x },
        }
    }

    /// Map a point in the rotated frame back to an image sized `original`
    pub fn to_original(&self, point: Coordinates, original: (u32, u32)) -> Coordinates {
        let rotated = self.rotated_size(original);
        self.inverse().to_rotated(point, rotated)
    }
}

/// Rotate an image counter-clockwise
pub fn rotate<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, rotation: Rotation) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    // imageops rotates clockwise
    match rotation {
        Rotation::None => image.clone(),
        Rotation::Ccw90 => imageops::rotate270(image),
        Rotation::Ccw180 => imageops::rotate180(image),
        Rotation::Ccw270 => imageops::rotate90(image),
    }
}

/// Undo `rotation` on an image that was produced (or annotated) in the rotated frame
pub fn rotate_back<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, rotation: Rotation) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    rotate(image, rotation.inverse())
}
