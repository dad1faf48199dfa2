//! Scattering geometry and momentum transfer.
//!
//! A geometry yields one scattering angle `tth` (degrees) per analyzer
//! channel. Together with a calibration these define `q` for every channel
//! along the energy-loss axis.

use ndarray::Array2;
use xrsred_core::calibration::Calibration;
use xrsred_core::error::{Error, Result};
use xrsred_core::spectrum::{QTable, QUnits};
use xrsred_core::units::{wavenumber_au, wavenumber_inv_angstrom};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source of per-channel scattering angles.
pub trait ScatteringGeometry {
    /// Scattering angle of every channel, in channel order (degrees).
    fn tth(&self) -> Vec<f64>;

    /// Number of channels described by the geometry.
    fn num_channels(&self) -> usize {
        self.tth().len()
    }
}

/// Scattering angle of an analyzer displaced by `horizontal` and `vertical`
/// angles from the direct beam (all degrees).
#[must_use]
pub fn spherical_tth(horizontal: f64, vertical: f64) -> f64 {
    (horizontal.to_radians().cos() * vertical.to_radians().cos())
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// One analyzer module positioned at a mean scattering angle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalyzerModule {
    /// Module name, e.g. `VD`.
    pub name: String,
    /// Mean scattering angle along the module's scanning direction (degrees).
    pub mean_tth: f64,
}

impl AnalyzerModule {
    /// Creates a module.
    #[must_use]
    pub fn new(name: impl Into<String>, mean_tth: f64) -> Self {
        Self {
            name: name.into(),
            mean_tth,
        }
    }
}

/// Multi-module spectrometer with analyzers on a 2D grid per module.
///
/// Each analyzer sits at a fixed offset across and along the module's
/// scanning direction; the module mean angle is added to the offset along.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleGeometry {
    /// Modules in output order.
    pub modules: Vec<AnalyzerModule>,
    /// Per-analyzer offset across the scanning direction (degrees).
    pub offsets_across: Vec<f64>,
    /// Per-analyzer offset along the scanning direction (degrees).
    pub offsets_along: Vec<f64>,
}

impl ModuleGeometry {
    /// Names of the six modules of the default spectrometer.
    pub const MODULE_NAMES: [&'static str; 6] = ["VD", "VU", "VB", "HR", "HL", "HB"];

    /// Offsets across the scanning direction, 12 analyzers per module.
    pub const OFFSETS_ACROSS: [f64; 12] = [
        5.0, 0.0, -5.0, 5.0, 0.0, -5.0, 5.0, 0.0, -5.0, 5.0, 0.0, -5.0,
    ];

    /// Offsets along the scanning direction, 12 analyzers per module.
    pub const OFFSETS_ALONG: [f64; 12] = [
        -9.71, -9.75, -9.71, -3.24, -3.25, -3.24, 3.24, 3.25, 3.24, 9.71, 9.75, 9.71,
    ];

    /// Six-module spectrometer with mean angles given in
    /// [`Self::MODULE_NAMES`] order.
    #[must_use]
    pub fn six_module(mean_tth: [f64; 6]) -> Self {
        Self {
            modules: Self::MODULE_NAMES
                .iter()
                .zip(mean_tth)
                .map(|(name, tth)| AnalyzerModule::new(*name, tth))
                .collect(),
            offsets_across: Self::OFFSETS_ACROSS.to_vec(),
            offsets_along: Self::OFFSETS_ALONG.to_vec(),
        }
    }

    /// Reorders modules by name; modules not named are dropped.
    pub fn with_order(mut self, order: &[&str]) -> Result<Self> {
        let mut modules = Vec::with_capacity(order.len());
        for name in order {
            let module = self
                .modules
                .iter()
                .find(|module| module.name == *name)
                .ok_or_else(|| Error::UnknownModule((*name).to_string()))?;
            modules.push(module.clone());
        }
        self.modules = modules;
        Ok(self)
    }

    /// Set the mean angle of one module.
    pub fn with_module_angle(mut self, name: &str, mean_tth: f64) -> Result<Self> {
        let module = self
            .modules
            .iter_mut()
            .find(|module| module.name == name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;
        module.mean_tth = mean_tth;
        Ok(self)
    }

    /// Scattering angles of one module's analyzers.
    #[must_use]
    pub fn module_tth(&self, module: &AnalyzerModule) -> Vec<f64> {
        self.offsets_along
            .iter()
            .zip(&self.offsets_across)
            .map(|(along, across)| spherical_tth(along + module.mean_tth, *across))
            .collect()
    }
}

impl ScatteringGeometry for ModuleGeometry {
    fn tth(&self) -> Vec<f64> {
        self.modules
            .iter()
            .flat_map(|module| self.module_tth(module))
            .collect()
    }

    fn num_channels(&self) -> usize {
        self.modules.len() * self.offsets_along.len().min(self.offsets_across.len())
    }
}

/// Single row of analyzers in the scattering plane.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearGeometry {
    /// Mean scattering angle (degrees).
    pub mean_tth: f64,
    /// Per-analyzer offset from the mean (degrees).
    pub offsets: Vec<f64>,
}

impl LinearGeometry {
    /// Offsets of the nine-analyzer row.
    pub const NINE_ANALYZER_OFFSETS: [f64; 9] =
        [-13.0, -6.5, -6.5, 0.0, 0.0, 6.5, 6.5, 13.0, 13.0];

    /// Nine-analyzer row at `mean_tth`.
    #[must_use]
    pub fn nine_analyzer(mean_tth: f64) -> Self {
        Self {
            mean_tth,
            offsets: Self::NINE_ANALYZER_OFFSETS.to_vec(),
        }
    }

    /// Set the offsets.
    #[must_use]
    pub fn with_offsets(mut self, offsets: Vec<f64>) -> Self {
        self.offsets = offsets;
        self
    }
}

impl ScatteringGeometry for LinearGeometry {
    fn tth(&self) -> Vec<f64> {
        self.offsets
            .iter()
            .map(|offset| (self.mean_tth + offset).abs())
            .collect()
    }

    fn num_channels(&self) -> usize {
        self.offsets.len()
    }
}

/// Momentum transfer for incident and scattered energies (keV) at `tth`
/// degrees: `q = sqrt(k1^2 + k2^2 - 2 k1 k2 cos(tth))`.
#[must_use]
pub fn momentum_transfer(incident: f64, scattered: f64, tth: f64, units: QUnits) -> f64 {
    let wavenumber = match units {
        QUnits::AtomicUnits => wavenumber_au,
        QUnits::InverseAngstrom => wavenumber_inv_angstrom,
    };
    let k1 = wavenumber(incident);
    let k2 = wavenumber(scattered);
    (k1 * k1 + k2 * k2 - 2.0 * k1 * k2 * tth.to_radians().cos())
        .max(0.0)
        .sqrt()
}

/// Momentum transfer of every channel along `eloss`.
///
/// The scattered energy is the calibration's `E0`; the incident energy of a
/// point is `E0 + eloss / energy_scale`.
pub fn q_table(
    eloss: &[f64],
    calibration: &Calibration,
    tth: &[f64],
    units: QUnits,
) -> Result<QTable> {
    if tth.len() != calibration.num_channels() {
        return Err(Error::LengthMismatch {
            what: "scattering angles",
            expected: calibration.num_channels(),
            actual: tth.len(),
        });
    }
    let e0 = calibration.e0();
    let scale = calibration.energy_scale();
    let values = Array2::from_shape_fn((eloss.len(), tth.len()), |(point, channel)| {
        momentum_transfer(e0 + eloss[point] / scale, e0, tth[channel], units)
    });
    QTable::new(units, tth.to_vec(), eloss.to_vec(), values)
}

/// [`q_table`] with angles taken from a geometry.
pub fn resolve_geometry<G: ScatteringGeometry + ?Sized>(
    geometry: &G,
    eloss: &[f64],
    calibration: &Calibration,
    units: QUnits,
) -> Result<QTable> {
    q_table(eloss, calibration, &geometry.tth(), units)
}
