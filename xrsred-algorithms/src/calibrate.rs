//! Energy calibration from the aggregated elastic group.

use crate::peak::{centroid, fwhm, trapezoid};
use std::collections::BTreeMap;
use xrsred_core::calibration::{Calibration, Resolution};
use xrsred_core::error::CalibrationError;
use xrsred_core::group::Group;
use xrsred_core::scan::ScanLabel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for elastic-line calibration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Label of the group holding the elastic line.
    pub elastic_label: ScanLabel,
    /// Channel whose centroid defines the shared energy-loss axis.
    pub reference_channel: usize,
    /// Factor from raw energy to energy loss (1000 for keV to eV).
    pub energy_scale: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            elastic_label: ScanLabel::elastic(),
            reference_channel: 0,
            energy_scale: 1000.0,
        }
    }
}

impl CalibrationConfig {
    /// Set the elastic group label.
    #[must_use]
    pub fn with_elastic_label(mut self, label: ScanLabel) -> Self {
        self.elastic_label = label;
        self
    }

    /// Set the reference channel.
    #[must_use]
    pub fn with_reference_channel(mut self, channel: usize) -> Self {
        self.reference_channel = channel;
        self
    }

    /// Set the energy scale.
    #[must_use]
    pub fn with_energy_scale(mut self, scale: f64) -> Self {
        self.energy_scale = scale;
        self
    }
}

/// Calibrates from the elastic group found in `groups`.
pub fn calibrate(
    groups: &BTreeMap<ScanLabel, Group>,
    config: &CalibrationConfig,
) -> Result<Calibration, CalibrationError> {
    let elastic = groups
        .get(&config.elastic_label)
        .ok_or_else(|| CalibrationError::MissingElastic(config.elastic_label.to_string()))?;
    calibrate_group(elastic, config)
}

/// Calibrates every channel of an elastic group.
///
/// Each channel's zero point is the centroid of its elastic line. The
/// resolution is the FWHM on that channel's own energy-loss axis; channels
/// without a measurable FWHM are kept with [`Resolution::Unavailable`].
pub fn calibrate_group(
    elastic: &Group,
    config: &CalibrationConfig,
) -> Result<Calibration, CalibrationError> {
    let energy = elastic.energy();
    let channels = elastic.num_channels();
    let mut centroids = Vec::with_capacity(channels);
    let mut resolution = Vec::with_capacity(channels);

    for channel in 0..channels {
        let signal = elastic.signals().column(channel).to_vec();
        let cenom = centroid(energy, &signal).ok_or_else(|| {
            CalibrationError::DegenerateCentroid {
                channel,
                integral: trapezoid(energy, &signal),
            }
        })?;

        let eloss: Vec<f64> = energy
            .iter()
            .map(|e| (e - cenom) * config.energy_scale)
            .collect();
        let width = if let Some(peak) = fwhm(&eloss, &signal) {
            Resolution::Measured(peak.width)
        } else {
            log::warn!("channel {channel}: no FWHM for elastic line, resolution set to 0");
            Resolution::Unavailable
        };

        centroids.push(cenom);
        resolution.push(width);
    }

    let calibration = Calibration::new(
        centroids,
        resolution,
        config.reference_channel,
        config.energy_scale,
    )?;
    log::info!(
        "calibrated {} channels from '{}': E0 = {:.6}, {} degraded",
        calibration.num_channels(),
        elastic.label(),
        calibration.e0(),
        calibration.degraded_channels().len()
    );
    Ok(calibration)
}
