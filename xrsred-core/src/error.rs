//! Error types for xrsred-core.

use crate::stage::Stage;
use thiserror::Error;

/// Result type alias for xrsred operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for scan reduction.
#[derive(Error, Debug)]
pub enum Error {
    /// ROI pixel lies outside the detector it was defined against.
    #[error("ROI {channel} pixel ({x}, {y}) outside detector of {width}x{height} pixels")]
    RoiOutOfBounds {
        channel: usize,
        x: u16,
        y: u16,
        width: usize,
        height: usize,
    },

    /// ROI with no pixels.
    #[error("ROI {channel} contains no pixels")]
    EmptyRoi { channel: usize },

    /// ROI set with no channels.
    #[error("ROI set is empty")]
    EmptyRoiSet,

    /// Frame shape differs from the detector shape of the ROI set.
    #[error("frame shape {actual_height}x{actual_width} does not match detector {height}x{width}")]
    FrameShapeMismatch {
        height: usize,
        width: usize,
        actual_height: usize,
        actual_width: usize,
    },

    /// Negative or non-finite pixel value in a raw frame.
    #[error("invalid pixel value {value} at ({x}, {y})")]
    InvalidPixel { x: usize, y: usize, value: f64 },

    /// Zero, negative or non-finite monitor count.
    #[error("scan {scan}: invalid monitor value {value} at point {point}")]
    InvalidMonitor { scan: u32, point: usize, value: f64 },

    /// Two arrays that must be aligned have different lengths.
    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Requested counter column does not exist.
    #[error("counter column '{0}' not found")]
    MissingCounter(String),

    /// Channel index not covered by the ROI set.
    #[error("channel {channel} out of range for {channels} channels")]
    ChannelOutOfRange { channel: usize, channels: usize },

    /// Scan number already registered.
    #[error("scan {0} is already registered")]
    DuplicateScan(u32),

    /// Scan number not registered.
    #[error("scan {0} is not registered")]
    UnknownScan(u32),

    /// Scan with no points.
    #[error("scan {0} has no points")]
    EmptyScan(u32),

    /// No aggregated group carries the label.
    #[error("no group labelled '{0}'")]
    MissingGroup(String),

    /// Analyzer module name not part of the geometry.
    #[error("unknown analyzer module '{0}'")]
    UnknownModule(String),

    /// Pipeline stage invoked before its prerequisite.
    #[error("operation requires stage '{required}', pipeline is '{current}'")]
    Precondition { required: Stage, current: Stage },

    /// Aggregation error.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Calibration error.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Errors raised while combining scans of one label into a group.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// Member scan point count differs from the group reference scan.
    #[error(
        "group '{label}': scan {scan} has {actual} points, reference scan {reference} has {expected}"
    )]
    PointCountMismatch {
        label: String,
        scan: u32,
        reference: u32,
        expected: usize,
        actual: usize,
    },

    /// Member scan channel count differs from the group reference scan.
    #[error("group '{label}': scan {scan} has {actual} channels, expected {expected}")]
    ChannelCountMismatch {
        label: String,
        scan: u32,
        expected: usize,
        actual: usize,
    },

    /// Group with no member scans.
    #[error("group '{0}' has no scans")]
    EmptyGroup(String),

    /// Combined arrays of the group do not line up.
    #[error("group '{label}': {reason}")]
    InconsistentShape { label: String, reason: String },
}

impl AggregationError {
    /// Label of the group that failed.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            AggregationError::PointCountMismatch { label, .. }
            | AggregationError::ChannelCountMismatch { label, .. }
            | AggregationError::InconsistentShape { label, .. }
            | AggregationError::EmptyGroup(label) => label,
        }
    }
}

/// Errors raised while deriving the energy calibration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// No group carries the elastic label.
    #[error("no '{0}' group available: load and aggregate at least one elastic scan first")]
    MissingElastic(String),

    /// Channel has no integrated elastic intensity.
    #[error("channel {channel}: elastic intensity integrates to {integral}, centroid undefined")]
    DegenerateCentroid { channel: usize, integral: f64 },

    /// Reference channel not covered by the calibration.
    #[error("reference channel {channel} out of range for {channels} channels")]
    ReferenceChannel { channel: usize, channels: usize },

    /// Calibration with no channels.
    #[error("calibration requires at least one channel")]
    NoChannels,

    /// Calibration and data disagree on the number of channels.
    #[error("calibration covers {expected} channels, data has {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
}
