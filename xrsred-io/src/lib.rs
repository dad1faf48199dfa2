//! xrsred-io: Output of reduced spectra.
//!
//! This crate writes spectra and momentum-transfer tables as CSV, and a
//! calibration summary as JSON.
//!

mod error;
mod writer;

pub use error::{Error, Result};
pub use writer::{ReductionSummary, SpectrumWriter};
