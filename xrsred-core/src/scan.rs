//! Scans: one measurement sequence of integrated analyzer signals.
#![allow(clippy::module_name_repetitions)]

use crate::channels::ChannelSet;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Free-form scan type tag used to group repeated measurements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanLabel(String);

impl ScanLabel {
    /// Reference measurement of the quasi-elastic line.
    pub const ELASTIC: &'static str = "elastic";
    /// Long overview scan.
    pub const LONG: &'static str = "long";
    /// Untagged scan.
    pub const GENERIC: &'static str = "generic";

    /// Creates a label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The elastic label.
    #[must_use]
    pub fn elastic() -> Self {
        Self::new(Self::ELASTIC)
    }

    /// Label of region `n` (1-based) of a scan loop, e.g. `edge1`.
    #[must_use]
    pub fn edge(n: usize) -> Self {
        Self(format!("edge{n}"))
    }

    /// Label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScanLabel {
    fn default() -> Self {
        Self::new(Self::GENERIC)
    }
}

impl fmt::Display for ScanLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScanLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// One measurement sequence.
///
/// Signals and errors are `points x channels` and hold raw integrated
/// counts; monitor normalization is an explicit transform
/// ([`Scan::normalized`]) so raw counts stay recoverable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Scan {
    number: u32,
    label: ScanLabel,
    energy: Vec<f64>,
    monitor: Vec<f64>,
    signals: Array2<f64>,
    errors: Array2<f64>,
    eloss: Option<Vec<f64>>,
}

impl Scan {
    /// Creates a scan from integrated signals and their errors.
    pub fn new(
        number: u32,
        label: ScanLabel,
        energy: Vec<f64>,
        monitor: Vec<f64>,
        signals: Array2<f64>,
        errors: Array2<f64>,
    ) -> Result<Self> {
        let points = energy.len();
        if points == 0 {
            return Err(Error::EmptyScan(number));
        }
        check_len("monitor", points, monitor.len())?;
        check_len("signal rows", points, signals.nrows())?;
        check_len("error rows", points, errors.nrows())?;
        check_len("error channels", signals.ncols(), errors.ncols())?;
        if let Some((point, &value)) = monitor
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite() || **value <= 0.0)
        {
            return Err(Error::InvalidMonitor {
                scan: number,
                point,
                value,
            });
        }
        Ok(Self {
            number,
            label,
            energy,
            monitor,
            signals,
            errors,
            eloss: None,
        })
    }

    /// Creates a scan from raw counts, with Poisson errors `sqrt(counts)`.
    pub fn from_counts(
        number: u32,
        label: ScanLabel,
        energy: Vec<f64>,
        monitor: Vec<f64>,
        signals: Array2<f64>,
    ) -> Result<Self> {
        let errors = signals.mapv(|count| count.max(0.0).sqrt());
        Self::new(number, label, energy, monitor, signals, errors)
    }

    /// Scan number.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Scan type label.
    #[must_use]
    pub fn label(&self) -> &ScanLabel {
        &self.label
    }

    /// Number of scan points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    /// Always false for a constructed scan.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Number of analyzer channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.signals.ncols()
    }

    /// Primary energy per point (keV).
    #[must_use]
    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// Monitor counts per point.
    #[must_use]
    pub fn monitor(&self) -> &[f64] {
        &self.monitor
    }

    /// Signals, `points x channels`.
    #[must_use]
    pub fn signals(&self) -> ArrayView2<'_, f64> {
        self.signals.view()
    }

    /// Errors, `points x channels`.
    #[must_use]
    pub fn errors(&self) -> ArrayView2<'_, f64> {
        self.errors.view()
    }

    /// Signal of one channel.
    pub fn channel_signal(&self, channel: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_channel(channel)?;
        Ok(self.signals.column(channel))
    }

    /// Error of one channel.
    pub fn channel_error(&self, channel: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_channel(channel)?;
        Ok(self.errors.column(channel))
    }

    /// Energy-loss axis (eV), once a calibration has been applied.
    #[must_use]
    pub fn eloss(&self) -> Option<&[f64]> {
        self.eloss.as_deref()
    }

    /// New scan with signals and errors divided by the monitor.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let monitor = Array1::from(self.monitor.clone()).insert_axis(Axis(1));
        Self {
            signals: &self.signals / &monitor,
            errors: &self.errors / &monitor,
            ..self.clone()
        }
    }

    /// New scan carrying an energy-loss axis and signals resampled onto it.
    pub fn with_eloss(
        &self,
        eloss: Vec<f64>,
        signals: Array2<f64>,
        errors: Array2<f64>,
    ) -> Result<Self> {
        check_len("eloss", self.len(), eloss.len())?;
        check_len("signal rows", self.len(), signals.nrows())?;
        check_len("signal channels", self.num_channels(), signals.ncols())?;
        if signals.dim() != errors.dim() {
            return Err(Error::LengthMismatch {
                what: "error values",
                expected: signals.len(),
                actual: errors.len(),
            });
        }
        Ok(Self {
            signals,
            errors,
            eloss: Some(eloss),
            ..self.clone()
        })
    }

    /// Sum over selected channels; errors add in quadrature.
    pub fn channel_sum(&self, channels: &ChannelSet) -> Result<(Array1<f64>, Array1<f64>)> {
        if let Some(channel) = channels.max().filter(|&c| c >= self.num_channels()) {
            return Err(Error::ChannelOutOfRange {
                channel,
                channels: self.num_channels(),
            });
        }
        let mut signal = Array1::zeros(self.len());
        let mut variance = Array1::zeros(self.len());
        for channel in channels.iter() {
            signal += &self.signals.column(channel);
            variance += &self.errors.column(channel).mapv(|e| e * e);
        }
        Ok((signal, variance.mapv(f64::sqrt)))
    }

    fn check_channel(&self, channel: usize) -> Result<()> {
        if channel < self.num_channels() {
            Ok(())
        } else {
            Err(Error::ChannelOutOfRange {
                channel,
                channels: self.num_channels(),
            })
        }
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}
