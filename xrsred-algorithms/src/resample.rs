//! Resampling of per-channel signals onto the shared energy-loss axis.

use crate::interpolate::BoundedLinear;
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use std::sync::Arc;
use xrsred_core::calibration::Calibration;
use xrsred_core::error::{CalibrationError, Error, Result};
use xrsred_core::group::Group;
use xrsred_core::scan::Scan;
use xrsred_core::spectrum::Spectrum;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for resampling.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResampleConfig {
    /// Resample channels in parallel.
    pub parallel: bool,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ResampleConfig {
    /// Set whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Signals and errors on a shared energy-loss axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// Shared energy-loss axis, one value per raw point.
    pub eloss: Vec<f64>,
    /// Resampled signals, `points x channels`.
    pub signals: Array2<f64>,
    /// Resampled errors, `points x channels`.
    pub errors: Array2<f64>,
}

/// Moves every channel from its own energy-loss axis onto the shared one.
///
/// Channel `i` sees point `E` at `(E - centroid_i) * scale`; the shared axis
/// uses the reference channel's centroid. Each channel's signal and error are
/// linearly interpolated onto the shared axis with zero fill outside the
/// channel's observed domain.
pub fn resample_channels(
    energy: &[f64],
    signals: ArrayView2<'_, f64>,
    errors: ArrayView2<'_, f64>,
    calibration: &Calibration,
    config: &ResampleConfig,
) -> Result<Resampled> {
    let channels = signals.ncols();
    if calibration.num_channels() != channels {
        return Err(CalibrationError::ChannelCountMismatch {
            expected: calibration.num_channels(),
            actual: channels,
        }
        .into());
    }
    if signals.nrows() != energy.len() || errors.dim() != signals.dim() {
        return Err(Error::LengthMismatch {
            what: "resampled points",
            expected: energy.len(),
            actual: signals.nrows().min(errors.nrows()),
        });
    }

    let eloss = calibration.eloss_axis(energy);
    let resample_one = |channel: usize| -> Result<(Vec<f64>, Vec<f64>)> {
        let own = calibration.channel_axis(channel, energy)?;
        let signal = BoundedLinear::new(&own, &signals.column(channel).to_vec());
        let error = BoundedLinear::new(&own, &errors.column(channel).to_vec());
        Ok((signal.eval_many(&eloss), error.eval_many(&eloss)))
    };
    let columns: Vec<(Vec<f64>, Vec<f64>)> = if config.parallel {
        (0..channels)
            .into_par_iter()
            .map(resample_one)
            .collect::<Result<_>>()?
    } else {
        (0..channels).map(resample_one).collect::<Result<_>>()?
    };

    let mut out_signals = Array2::zeros((energy.len(), channels));
    let mut out_errors = Array2::zeros((energy.len(), channels));
    for (channel, (signal, error)) in columns.into_iter().enumerate() {
        for (point, (s, e)) in signal.into_iter().zip(error).enumerate() {
            out_signals[[point, channel]] = s;
            out_errors[[point, channel]] = e;
        }
    }
    Ok(Resampled {
        eloss,
        signals: out_signals,
        errors: out_errors,
    })
}

/// Resamples one aggregated group into a spectrum.
pub fn resample_group(
    group: &Group,
    calibration: &Arc<Calibration>,
    config: &ResampleConfig,
) -> Result<Spectrum> {
    assemble_spectrum([group], calibration, config)
}

/// Resamples a single scan, returning a copy that carries the shared axis.
pub fn resample_scan(
    scan: &Scan,
    calibration: &Calibration,
    config: &ResampleConfig,
) -> Result<Scan> {
    let resampled = resample_channels(
        scan.energy(),
        scan.signals(),
        scan.errors(),
        calibration,
        config,
    )?;
    scan.with_eloss(resampled.eloss, resampled.signals, resampled.errors)
}

/// Points of several groups merged into one energy-ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    /// Raw energies in ascending order.
    pub energy: Vec<f64>,
    /// Signals, `points x channels`.
    pub signals: Array2<f64>,
    /// Errors, `points x channels`.
    pub errors: Array2<f64>,
}

/// Appends the points of `groups` and stably sorts them by energy.
///
/// Points with equal energy keep the order of the groups they came from.
pub fn assemble<'a, I>(groups: I, channels: usize) -> Result<Assembled>
where
    I: IntoIterator<Item = &'a Group>,
{
    let mut points: Vec<(f64, &'a Group, usize)> = Vec::new();
    for group in groups {
        if group.num_channels() != channels {
            return Err(Error::LengthMismatch {
                what: "group channels",
                expected: channels,
                actual: group.num_channels(),
            });
        }
        points.extend(
            group
                .energy()
                .iter()
                .enumerate()
                .map(|(row, &energy)| (energy, group, row)),
        );
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut signals = Array2::zeros((points.len(), channels));
    let mut errors = Array2::zeros((points.len(), channels));
    for (point, (_, group, row)) in points.iter().enumerate() {
        signals.row_mut(point).assign(&group.signals().row(*row));
        errors.row_mut(point).assign(&group.errors().row(*row));
    }
    Ok(Assembled {
        energy: points.iter().map(|(energy, _, _)| *energy).collect(),
        signals,
        errors,
    })
}

/// Assembles `groups` and resamples the result onto the shared axis.
pub fn assemble_spectrum<'a, I>(
    groups: I,
    calibration: &Arc<Calibration>,
    config: &ResampleConfig,
) -> Result<Spectrum>
where
    I: IntoIterator<Item = &'a Group>,
{
    let groups: Vec<&Group> = groups.into_iter().collect();
    let assembled = assemble(groups.iter().copied(), calibration.num_channels())?;
    let resampled = resample_channels(
        &assembled.energy,
        assembled.signals.view(),
        assembled.errors.view(),
        calibration,
        config,
    )?;
    log::debug!(
        "resampled {} groups onto {} points",
        groups.len(),
        resampled.eloss.len()
    );
    Spectrum::new(
        groups.iter().map(|group| group.label().clone()).collect(),
        assembled.energy,
        resampled.eloss,
        resampled.signals,
        resampled.errors,
        Arc::clone(calibration),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use xrsred_core::calibration::Resolution;
    use xrsred_core::scan::ScanLabel;

    fn calibration(centroids: Vec<f64>) -> Arc<Calibration> {
        let n = centroids.len();
        Arc::new(Calibration::new(centroids, vec![Resolution::Measured(1.0); n], 0, 1000.0).unwrap())
    }

    fn group(label: &str, energy: Vec<f64>, channels: usize) -> Group {
        let points = energy.len();
        let signals = Array2::from_shape_fn((points, channels), |(p, c)| (p * 10 + c) as f64);
        let errors = signals.mapv(f64::sqrt);
        Group::from_parts(
            ScanLabel::new(label),
            vec![1],
            energy,
            vec![1.0; points],
            signals,
            errors,
        )
        .unwrap()
    }

    #[test]
    fn test_identical_centroids_is_identity() {
        let g = group("edge1", vec![10.0, 10.001, 10.002, 10.003], 3);
        let cal = calibration(vec![10.0005; 3]);
        let spectrum = resample_group(&g, &cal, &ResampleConfig::default()).unwrap();
        assert_eq!(spectrum.signals(), g.signals());
        assert_eq!(spectrum.errors(), g.errors());
        assert_relative_eq!(spectrum.eloss()[0], -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_shifted_channel() {
        // channel 1 sits 500 eV above the reference
        let g = group("edge1", vec![10.0, 10.5, 11.0, 11.5], 2);
        let cal = calibration(vec![10.0, 10.5]);
        let spectrum = resample_group(&g, &cal, &ResampleConfig::default()).unwrap();
        let shifted = spectrum.channel_signal(1).unwrap();
        // own axis of channel 1 is [-500, 0, 500, 1000], shared axis [0, 500, 1000, 1500]
        assert_eq!(shifted[0], 11.0);
        assert_eq!(shifted[2], 31.0);
        assert_eq!(shifted[3], 0.0);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let g = group("edge1", vec![10.0, 10.0012, 10.0031, 10.004], 4);
        let cal = calibration(vec![10.0, 10.0004, 9.9993, 10.0021]);
        let par = resample_group(&g, &cal, &ResampleConfig::default()).unwrap();
        let seq = resample_group(&g, &cal, &ResampleConfig::default().with_parallel(false)).unwrap();
        assert_eq!(par.signals(), seq.signals());
        assert_eq!(par.errors(), seq.errors());
    }

    #[test]
    fn test_channel_count_mismatch() {
        let g = group("edge1", vec![10.0, 10.001], 2);
        let cal = calibration(vec![10.0, 10.0, 10.0]);
        let err = resample_group(&g, &cal, &ResampleConfig::default()).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
        let err = resample_channels(
            g.energy(),
            g.signals(),
            g.errors(),
            &cal,
            &ResampleConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Calibration(CalibrationError::ChannelCountMismatch { .. })
        ));
    }

    #[test]
    fn test_assemble_sorts_by_energy() {
        let high = group("edge2", vec![10.5, 10.6], 1);
        let low = group("edge1", vec![10.0, 10.55], 1);
        let assembled = assemble([&high, &low], 1).unwrap();
        assert_eq!(assembled.energy, vec![10.0, 10.5, 10.55, 10.6]);
        assert_eq!(assembled.signals.column(0).to_vec(), vec![0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_resample_scan_carries_axis() {
        let scan = Scan::from_counts(
            5,
            ScanLabel::new("edge1"),
            vec![10.0, 10.001, 10.002],
            vec![1.0; 3],
            Array2::from_elem((3, 2), 4.0),
        )
        .unwrap();
        let cal = calibration(vec![10.0, 10.0]);
        let resampled = resample_scan(&scan, &cal, &ResampleConfig::default()).unwrap();
        assert_eq!(resampled.eloss().unwrap().len(), 3);
        assert_eq!(resampled.signals(), scan.signals());
        assert!(scan.eloss().is_none());
    }
}
