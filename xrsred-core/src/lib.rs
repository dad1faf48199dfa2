//! xrsred-core: Core types for X-ray Raman scattering scan reduction.
//!
//! This crate provides the data model shared by the reduction stages:
//! detector frames and ROIs, counter tables, scans and their registry,
//! aggregated groups, calibration records and the final spectra.
//!

pub mod calibration;
pub mod channels;
pub mod counters;
pub mod error;
pub mod group;
pub mod pixel;
pub mod registry;
pub mod roi;
pub mod scan;
pub mod spectrum;
pub mod stage;
pub mod units;

pub use calibration::{Calibration, Resolution};
pub use channels::ChannelSet;
pub use counters::{CounterColumns, CounterTable, EnergySource};
pub use error::{AggregationError, CalibrationError, Error, Result};
pub use group::Group;
pub use pixel::{DetectorShape, PixelCoord, RawFrame};
pub use registry::{loop_labels, ScanRegistry};
pub use roi::{Roi, RoiSet};
pub use scan::{Scan, ScanLabel};
pub use spectrum::{QTable, QUnits, Spectrum};
pub use stage::Stage;
