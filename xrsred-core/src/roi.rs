//! Regions of interest: one pixel set per analyzer channel.

use crate::error::{Error, Result};
use crate::pixel::{DetectorShape, PixelCoord};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel set assigned to one analyzer channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Roi {
    pixels: Vec<PixelCoord>,
}

impl Roi {
    /// Creates a ROI from explicit pixel coordinates.
    #[must_use]
    pub fn new(pixels: Vec<PixelCoord>) -> Self {
        Self { pixels }
    }

    /// Rectangular ROI with its top-left corner at `(x0, y0)`.
    #[must_use]
    pub fn rectangle(x0: u16, y0: u16, width: u16, height: u16) -> Self {
        let pixels = (y0..y0.saturating_add(height))
            .flat_map(|y| (x0..x0.saturating_add(width)).map(move |x| PixelCoord::new(x, y)))
            .collect();
        Self { pixels }
    }

    /// Number of pixels in the ROI.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the ROI has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel coordinates in definition order.
    #[must_use]
    pub fn pixels(&self) -> &[PixelCoord] {
        &self.pixels
    }

    /// Returns an iterator over the pixels.
    pub fn iter(&self) -> impl Iterator<Item = &PixelCoord> {
        self.pixels.iter()
    }
}

impl FromIterator<PixelCoord> for Roi {
    fn from_iter<I: IntoIterator<Item = PixelCoord>>(iter: I) -> Self {
        Self {
            pixels: iter.into_iter().collect(),
        }
    }
}

/// Ordered ROIs validated against a fixed detector geometry.
///
/// The position of a ROI in the set is its channel index. Bounds are checked
/// once here, so integrating a frame of the same shape cannot go out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RoiSetParts")
)]
pub struct RoiSet {
    rois: Vec<Roi>,
    shape: DetectorShape,
}

impl RoiSet {
    /// Validates `rois` against `shape`.
    pub fn new(rois: Vec<Roi>, shape: DetectorShape) -> Result<Self> {
        if rois.is_empty() {
            return Err(Error::EmptyRoiSet);
        }
        for (channel, roi) in rois.iter().enumerate() {
            if roi.is_empty() {
                return Err(Error::EmptyRoi { channel });
            }
            if let Some(pixel) = roi.iter().find(|pixel| !shape.contains(**pixel)) {
                return Err(Error::RoiOutOfBounds {
                    channel,
                    x: pixel.x,
                    y: pixel.y,
                    width: shape.width,
                    height: shape.height,
                });
            }
        }
        Ok(Self { rois, shape })
    }

    /// Number of analyzer channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.rois.len()
    }

    /// Detector shape the ROIs were validated against.
    #[must_use]
    pub fn shape(&self) -> DetectorShape {
        self.shape
    }

    /// ROI of one channel.
    #[must_use]
    pub fn get(&self, channel: usize) -> Option<&Roi> {
        self.rois.get(channel)
    }

    /// ROIs in channel order.
    pub fn iter(&self) -> impl Iterator<Item = &Roi> {
        self.rois.iter()
    }
}

/// Unvalidated serialized form of a [`RoiSet`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RoiSetParts {
    rois: Vec<Roi>,
    shape: DetectorShape,
}

#[cfg(feature = "serde")]
impl TryFrom<RoiSetParts> for RoiSet {
    type Error = Error;

    fn try_from(parts: RoiSetParts) -> Result<Self> {
        Self::new(parts.rois, parts.shape)
    }
}
