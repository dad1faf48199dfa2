//! Aggregated scans sharing one label.

use crate::error::{Error, Result};
use crate::scan::ScanLabel;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Sum of all scans with one label.
///
/// The energy axis is the axis of the first member scan. Signals and monitor
/// counts are summed; errors are combined in quadrature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Group {
    label: ScanLabel,
    members: Vec<u32>,
    energy: Vec<f64>,
    monitor: Vec<f64>,
    signals: Array2<f64>,
    errors: Array2<f64>,
}

impl Group {
    /// Assembles a group from already-combined arrays.
    ///
    /// `energy`, `monitor` and the rows of `signals`/`errors` must have equal
    /// length, and `errors` must have one column per signal channel.
    pub fn from_parts(
        label: ScanLabel,
        members: Vec<u32>,
        energy: Vec<f64>,
        monitor: Vec<f64>,
        signals: Array2<f64>,
        errors: Array2<f64>,
    ) -> Result<Self> {
        let points = energy.len();
        for (what, expected, actual) in [
            ("group monitor", points, monitor.len()),
            ("group signal rows", points, signals.nrows()),
            ("group error rows", points, errors.nrows()),
            ("group error channels", signals.ncols(), errors.ncols()),
        ] {
            if expected != actual {
                return Err(Error::LengthMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }
        Ok(Self {
            label,
            members,
            energy,
            monitor,
            signals,
            errors,
        })
    }

    /// Group label.
    #[must_use]
    pub fn label(&self) -> &ScanLabel {
        &self.label
    }

    /// Member scan numbers; the first one defines the energy axis.
    #[must_use]
    pub fn members(&self) -> &[u32] {
        &self.members
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.energy.len()
    }

    /// Returns true if the group has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// Number of analyzer channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.signals.ncols()
    }

    /// Energy axis (keV).
    #[must_use]
    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// Summed monitor counts.
    #[must_use]
    pub fn monitor(&self) -> &[f64] {
        &self.monitor
    }

    /// Summed signals, `points x channels`.
    #[must_use]
    pub fn signals(&self) -> ArrayView2<'_, f64> {
        self.signals.view()
    }

    /// Quadrature-summed errors, `points x channels`.
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

    /// New group with signals and errors divided by the summed monitor.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let monitor = Array1::from(self.monitor.clone()).insert_axis(Axis(1));
        Self {
            signals: &self.signals / &monitor,
            errors: &self.errors / &monitor,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn summed() -> Group {
        Group::from_parts(
            ScanLabel::edge(1),
            vec![4, 5],
            vec![9.9, 10.0],
            vec![2.0, 8.0],
            array![[10.0, 4.0], [40.0, 16.0]],
            array![[2.0, 1.0], [4.0, 2.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_short_energy_axis() {
        let err = Group::from_parts(
            ScanLabel::elastic(),
            vec![1],
            vec![1.0; 5],
            vec![1.0; 5],
            Array2::ones((6, 1)),
            Array2::ones((6, 1)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                what: "group signal rows",
                expected: 5,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_rejects_error_shape() {
        let result = Group::from_parts(
            ScanLabel::elastic(),
            vec![1],
            vec![1.0, 2.0],
            vec![1.0, 1.0],
            Array2::ones((2, 3)),
            Array2::ones((2, 2)),
        );
        assert!(matches!(
            result,
            Err(Error::LengthMismatch {
                what: "group error channels",
                ..
            })
        ));
    }

    #[test]
    fn test_normalized_divides_by_summed_monitor() {
        let group = summed();
        let normalized = group.normalized();
        assert_relative_eq!(normalized.signals()[[0, 0]], 5.0);
        assert_relative_eq!(normalized.signals()[[1, 1]], 2.0);
        assert_relative_eq!(normalized.errors()[[1, 0]], 0.5);
        assert_eq!(normalized.members(), &[4, 5]);
        assert_relative_eq!(group.signals()[[0, 0]], 10.0);
    }

    #[test]
    fn test_channel_signal() {
        let group = summed();
        assert_eq!(group.channel_signal(1).unwrap().to_vec(), vec![4.0, 16.0]);
        assert!(matches!(
            group.channel_signal(2),
            Err(Error::ChannelOutOfRange {
                channel: 2,
                channels: 2
            })
        ));
    }
}
