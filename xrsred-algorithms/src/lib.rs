//! xrsred-algorithms: Reduction stages for X-ray Raman scattering scans.
//!
//! This crate provides the processing stages of a reduction:
//! - **Integration** - ROI sums of raw detector frames into scans
//! - **Aggregation** - Summing scans that share a label
//! - **Calibration** - Elastic-line centroids, resolution and `E0`
//! - **Resampling** - Per-channel signals onto a shared energy-loss axis
//! - **Geometry** - Scattering angles and momentum transfer
//!
#![warn(missing_docs)]

mod aggregation;
mod calibrate;
mod geometry;
mod integration;
pub mod interpolate;
pub mod peak;
mod pipeline;
mod resample;

pub use aggregation::{aggregate, aggregate_registry, AggregationReport};
pub use calibrate::{calibrate, calibrate_group, CalibrationConfig};
pub use geometry::{
    momentum_transfer, q_table, resolve_geometry, spherical_tth, AnalyzerModule, LinearGeometry,
    ModuleGeometry, ScatteringGeometry,
};
pub use integration::{
    build_scan, integrate_frame, integrate_frames, ChannelIntensities, IntegrationConfig,
};
pub use interpolate::BoundedLinear;
pub use pipeline::{Reduction, ReductionConfig};
pub use resample::{
    assemble, assemble_spectrum, resample_channels, resample_group, resample_scan, Assembled,
    ResampleConfig, Resampled,
};

// Re-export core types used in stage signatures
pub use xrsred_core::calibration::{Calibration, Resolution};
pub use xrsred_core::spectrum::{QTable, QUnits, Spectrum};
pub use xrsred_core::stage::Stage;
