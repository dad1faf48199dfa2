//! Pipeline stages.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Progress of a reduction run.
///
/// Resampling and geometry resolution both require a calibration; they
/// may run in either order once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stage {
    /// Scans registered, no calibration yet.
    Uncalibrated,
    /// Calibration derived from the elastic group.
    Calibrated,
    /// Signals resampled onto the shared energy-loss axis.
    Resampled,
    /// Momentum transfer resolved for every channel.
    GeometryResolved,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Uncalibrated => "uncalibrated",
            Stage::Calibrated => "calibrated",
            Stage::Resampled => "resampled",
            Stage::GeometryResolved => "geometry-resolved",
        };
        f.write_str(name)
    }
}
