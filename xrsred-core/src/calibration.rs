//! Energy calibration records derived from the elastic line.

use crate::error::{CalibrationError, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy resolution of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Resolution {
    /// FWHM of the elastic line in eV.
    Measured(f64),
    /// No half-maximum crossing on one side of the peak.
    Unavailable,
}

impl Resolution {
    /// FWHM in eV, 0.0 when unavailable.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Resolution::Measured(fwhm) => *fwhm,
            Resolution::Unavailable => 0.0,
        }
    }

    /// Returns true if the FWHM could be measured.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        matches!(self, Resolution::Measured(_))
    }
}

/// Per-channel energy zero points and the run's reference energy.
///
/// Read-only once built. A new elastic measurement yields a new record;
/// spectra keep a handle to the record they were derived from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "CalibrationParts")
)]
pub struct Calibration {
    centroids: Vec<f64>,
    resolution: Vec<Resolution>,
    e0: f64,
    reference_channel: usize,
    energy_scale: f64,
}

impl Calibration {
    /// Builds a calibration; `E0` is the mean of the channel centroids.
    ///
    /// `energy_scale` converts raw energy differences to energy loss
    /// (1000 for keV to eV).
    pub fn new(
        centroids: Vec<f64>,
        resolution: Vec<Resolution>,
        reference_channel: usize,
        energy_scale: f64,
    ) -> std::result::Result<Self, CalibrationError> {
        if centroids.is_empty() {
            return Err(CalibrationError::NoChannels);
        }
        if resolution.len() != centroids.len() {
            return Err(CalibrationError::ChannelCountMismatch {
                expected: centroids.len(),
                actual: resolution.len(),
            });
        }
        if reference_channel >= centroids.len() {
            return Err(CalibrationError::ReferenceChannel {
                channel: reference_channel,
                channels: centroids.len(),
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let e0 = centroids.iter().sum::<f64>() / centroids.len() as f64;
        Ok(Self {
            centroids,
            resolution,
            e0,
            reference_channel,
            energy_scale,
        })
    }

    /// Reference energy `E0` in raw energy units.
    #[must_use]
    pub fn e0(&self) -> f64 {
        self.e0
    }

    /// Number of calibrated channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.centroids.len()
    }

    /// Elastic centroid of every channel.
    #[must_use]
    pub fn centroids(&self) -> &[f64] {
        &self.centroids
    }

    /// Elastic centroid of one channel.
    #[must_use]
    pub fn centroid(&self, channel: usize) -> Option<f64> {
        self.centroids.get(channel).copied()
    }

    /// Resolution of every channel.
    #[must_use]
    pub fn resolution(&self) -> &[Resolution] {
        &self.resolution
    }

    /// Channel whose centroid defines the shared energy-loss axis.
    #[must_use]
    pub fn reference_channel(&self) -> usize {
        self.reference_channel
    }

    /// Centroid of the reference channel.
    #[must_use]
    pub fn reference_centroid(&self) -> f64 {
        self.centroids[self.reference_channel]
    }

    /// Factor from raw energy to energy-loss units.
    #[must_use]
    pub fn energy_scale(&self) -> f64 {
        self.energy_scale
    }

    /// Channels whose resolution could not be measured.
    #[must_use]
    pub fn degraded_channels(&self) -> Vec<usize> {
        self.resolution
            .iter()
            .enumerate()
            .filter(|(_, resolution)| !resolution.is_measured())
            .map(|(channel, _)| channel)
            .collect()
    }

    /// Shared energy-loss axis for a raw energy axis.
    #[must_use]
    pub fn eloss_axis(&self, energy: &[f64]) -> Vec<f64> {
        let zero = self.reference_centroid();
        energy
            .iter()
            .map(|&e| (e - zero) * self.energy_scale)
            .collect()
    }

    /// Energy loss of each raw point as seen by `channel`.
    pub fn channel_axis(&self, channel: usize, energy: &[f64]) -> Result<Vec<f64>> {
        let zero = self.centroid(channel).ok_or(Error::ChannelOutOfRange {
            channel,
            channels: self.num_channels(),
        })?;
        Ok(energy
            .iter()
            .map(|&e| (e - zero) * self.energy_scale)
            .collect())
    }
}

/// Serialized form of a [`Calibration`]; `E0` is recomputed on the way in.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct CalibrationParts {
    centroids: Vec<f64>,
    resolution: Vec<Resolution>,
    reference_channel: usize,
    energy_scale: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<CalibrationParts> for Calibration {
    type Error = CalibrationError;

    fn try_from(parts: CalibrationParts) -> std::result::Result<Self, CalibrationError> {
        Self::new(
            parts.centroids,
            parts.resolution,
            parts.reference_channel,
            parts.energy_scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_e0_is_mean_of_centroids() {
        let cal = Calibration::new(
            vec![10.0, 10.002, 10.004],
            vec![Resolution::Measured(1.2); 3],
            0,
            1000.0,
        )
        .unwrap();
        assert_relative_eq!(cal.e0(), 10.002, epsilon = 1e-12);
        assert!(cal.degraded_channels().is_empty());
    }

    #[test]
    fn test_axes() {
        let cal = Calibration::new(
            vec![10.0, 10.001],
            vec![Resolution::Measured(1.0), Resolution::Unavailable],
            0,
            1000.0,
        )
        .unwrap();
        let shared = cal.eloss_axis(&[10.0, 10.002]);
        assert_relative_eq!(shared[1], 2.0, epsilon = 1e-9);
        let own = cal.channel_axis(1, &[10.0, 10.002]).unwrap();
        assert_relative_eq!(own[0], -1.0, epsilon = 1e-9);
        assert_eq!(cal.degraded_channels(), vec![1]);
        assert_eq!(cal.resolution()[1].value(), 0.0);
    }

    #[test]
    fn test_rejects_bad_reference() {
        let err = Calibration::new(vec![10.0], vec![Resolution::Unavailable], 1, 1000.0)
            .unwrap_err();
        assert_eq!(
            err,
            CalibrationError::ReferenceChannel {
                channel: 1,
                channels: 1
            }
        );
    }

    #[test]
    fn test_channel_axis_out_of_range() {
        let cal = Calibration::new(vec![10.0], vec![Resolution::Unavailable], 0, 1000.0).unwrap();
        assert!(matches!(
            cal.channel_axis(1, &[10.0]),
            Err(Error::ChannelOutOfRange {
                channel: 1,
                channels: 1
            })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates_reference() {
        let json = r#"{"centroids":[10.0],"resolution":["Unavailable"],"e0":10.0,"reference_channel":7,"energy_scale":1000.0}"#;
        let err = serde_json::from_str::<Calibration>(json).unwrap_err();
        assert!(err.to_string().contains("reference channel 7"));

        let cal = Calibration::new(
            vec![10.0, 10.002],
            vec![Resolution::Measured(1.5), Resolution::Unavailable],
            1,
            1000.0,
        )
        .unwrap();
        let restored: Calibration =
            serde_json::from_str(&serde_json::to_string(&cal).unwrap()).unwrap();
        assert_eq!(restored, cal);
    }
}
