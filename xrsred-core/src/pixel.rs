//! Detector pixel coordinates and raw frames.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel coordinate on the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelCoord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl PixelCoord {
    /// Creates a new pixel coordinate.
    #[inline]
    #[must_use]
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Row index into a frame array.
    #[inline]
    #[must_use]
    pub fn row(&self) -> usize {
        usize::from(self.y)
    }

    /// Column index into a frame array.
    #[inline]
    #[must_use]
    pub fn col(&self) -> usize {
        usize::from(self.x)
    }
}

impl From<(u16, u16)> for PixelCoord {
    fn from((x, y): (u16, u16)) -> Self {
        Self::new(x, y)
    }
}

/// Detector dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorShape {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
}

impl DetectorShape {
    /// Creates a detector shape.
    #[must_use]
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Returns true if the coordinate lies on the detector.
    #[inline]
    #[must_use]
    pub fn contains(&self, coord: PixelCoord) -> bool {
        coord.row() < self.height && coord.col() < self.width
    }

    /// Total pixel count.
    #[must_use]
    pub fn pixels(&self) -> usize {
        self.height * self.width
    }
}

/// One detector image recorded at a single scan point.
///
/// Values are non-negative and finite; this is checked once on construction
/// so that integration never has to.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    data: Array2<f64>,
}

impl RawFrame {
    /// Wraps a 2D intensity array (rows = y, columns = x).
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if let Some(((y, x), &value)) = data
            .indexed_iter()
            .find(|(_, value)| !value.is_finite() || **value < 0.0)
        {
            return Err(Error::InvalidPixel { x, y, value });
        }
        Ok(Self { data })
    }

    /// Builds a frame from row-major values.
    pub fn from_shape_vec(height: usize, width: usize, values: Vec<f64>) -> Result<Self> {
        let expected = height * width;
        let actual = values.len();
        let data = Array2::from_shape_vec((height, width), values).map_err(|_| {
            Error::LengthMismatch {
                what: "frame pixels",
                expected,
                actual,
            }
        })?;
        Self::new(data)
    }

    /// Frame of zeros.
    #[must_use]
    pub fn zeros(shape: DetectorShape) -> Self {
        Self {
            data: Array2::zeros((shape.height, shape.width)),
        }
    }

    /// Detector shape of this frame.
    #[must_use]
    pub fn shape(&self) -> DetectorShape {
        let (height, width) = self.data.dim();
        DetectorShape::new(height, width)
    }

    /// Pixel value, or `None` when off the detector.
    #[inline]
    #[must_use]
    pub fn get(&self, coord: PixelCoord) -> Option<f64> {
        self.data.get((coord.row(), coord.col())).copied()
    }

    /// Read-only view of the pixel data.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }
}
