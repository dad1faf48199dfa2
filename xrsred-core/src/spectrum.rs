//! Calibrated spectra and momentum-transfer tables.

use crate::calibration::Calibration;
use crate::channels::ChannelSet;
use crate::error::{Error, Result};
use crate::scan::ScanLabel;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-channel signals on the shared energy-loss axis.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Spectrum {
    labels: Vec<ScanLabel>,
    energy: Vec<f64>,
    eloss: Vec<f64>,
    signals: Array2<f64>,
    errors: Array2<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    calibration: Arc<Calibration>,
}

impl Spectrum {
    /// Creates a spectrum; all arrays must share the point count.
    pub fn new(
        labels: Vec<ScanLabel>,
        energy: Vec<f64>,
        eloss: Vec<f64>,
        signals: Array2<f64>,
        errors: Array2<f64>,
        calibration: Arc<Calibration>,
    ) -> Result<Self> {
        let points = eloss.len();
        for (what, actual) in [
            ("energy", energy.len()),
            ("signal rows", signals.nrows()),
            ("error rows", errors.nrows()),
        ] {
            if actual != points {
                return Err(Error::LengthMismatch {
                    what,
                    expected: points,
                    actual,
                });
            }
        }
        if signals.ncols() != errors.ncols() {
            return Err(Error::LengthMismatch {
                what: "error channels",
                expected: signals.ncols(),
                actual: errors.ncols(),
            });
        }
        Ok(Self {
            labels,
            energy,
            eloss,
            signals,
            errors,
            calibration,
        })
    }

    /// Labels of the groups that contributed points.
    #[must_use]
    pub fn labels(&self) -> &[ScanLabel] {
        &self.labels
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.eloss.len()
    }

    /// Returns true if the spectrum has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.eloss.is_empty()
    }

    /// Number of analyzer channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.signals.ncols()
    }

    /// Raw energy of each point (keV).
    #[must_use]
    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// Shared energy-loss axis (eV).
    #[must_use]
    pub fn eloss(&self) -> &[f64] {
        &self.eloss
    }

    /// Resampled signals, `points x channels`.
    #[must_use]
    pub fn signals(&self) -> ArrayView2<'_, f64> {
        self.signals.view()
    }

    /// Resampled errors, `points x channels`.
    #[must_use]
    pub fn errors(&self) -> ArrayView2<'_, f64> {
        self.errors.view()
    }

    /// Signal of one channel.
    pub fn channel_signal(&self, channel: usize) -> Result<ArrayView1<'_, f64>> {
        if channel >= self.num_channels() {
            return Err(Error::ChannelOutOfRange {
                channel,
                channels: self.num_channels(),
            });
        }
        Ok(self.signals.column(channel))
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

    /// Calibration this spectrum was derived from.
    #[must_use]
    pub fn calibration(&self) -> &Arc<Calibration> {
        &self.calibration
    }
}

/// Units of momentum transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QUnits {
    /// Atomic units (inverse Bohr radius).
    #[default]
    AtomicUnits,
    /// Inverse Ångström.
    InverseAngstrom,
}

impl fmt::Display for QUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QUnits::AtomicUnits => f.write_str("a.u."),
            QUnits::InverseAngstrom => f.write_str("1/A"),
        }
    }
}

/// Momentum transfer of every channel along the energy-loss axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct QTable {
    units: QUnits,
    tth: Vec<f64>,
    eloss: Vec<f64>,
    values: Array2<f64>,
}

impl QTable {
    /// Creates a table; `values` is `points x channels`.
    pub fn new(units: QUnits, tth: Vec<f64>, eloss: Vec<f64>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != eloss.len() {
            return Err(Error::LengthMismatch {
                what: "q rows",
                expected: eloss.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != tth.len() {
            return Err(Error::LengthMismatch {
                what: "q channels",
                expected: tth.len(),
                actual: values.ncols(),
            });
        }
        Ok(Self {
            units,
            tth,
            eloss,
            values,
        })
    }

    /// Units of the values.
    #[must_use]
    pub fn units(&self) -> QUnits {
        self.units
    }

    /// Scattering angle of each channel (degrees).
    #[must_use]
    pub fn tth(&self) -> &[f64] {
        &self.tth
    }

    /// Energy-loss axis (eV).
    #[must_use]
    pub fn eloss(&self) -> &[f64] {
        &self.eloss
    }

    /// Values, `points x channels`.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// q along the axis for one channel.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Option<ArrayView1<'_, f64>> {
        (channel < self.values.ncols()).then(|| self.values.column(channel))
    }

    /// q of all channels at the axis point nearest to `eloss`.
    #[must_use]
    pub fn at_energy_loss(&self, eloss: f64) -> Option<ArrayView1<'_, f64>> {
        let index = self
            .eloss
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - eloss).abs().total_cmp(&(*b - eloss).abs()))
            .map(|(index, _)| index)?;
        Some(self.values.row(index))
    }
}
