//! Reduction session tying the stages together.
//!
//! The session owns the scan registry and the derived artefacts. Stages that
//! need a calibration return [`Error::Precondition`] when called too early.

use crate::aggregation::{aggregate_registry, AggregationReport};
use crate::calibrate::{calibrate, CalibrationConfig};
use crate::geometry::{resolve_geometry, ScatteringGeometry};
use crate::integration::{build_scan, IntegrationConfig};
use crate::resample::{
    assemble, assemble_spectrum, resample_group, resample_scan, ResampleConfig,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use xrsred_core::calibration::Calibration;
use xrsred_core::counters::{CounterColumns, CounterTable};
use xrsred_core::error::{AggregationError, Error, Result};
use xrsred_core::group::Group;
use xrsred_core::pixel::RawFrame;
use xrsred_core::registry::ScanRegistry;
use xrsred_core::roi::RoiSet;
use xrsred_core::scan::{Scan, ScanLabel};
use xrsred_core::spectrum::{QTable, QUnits, Spectrum};
use xrsred_core::stage::Stage;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of every stage of a reduction.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReductionConfig {
    /// Frame integration.
    pub integration: IntegrationConfig,
    /// Counter columns holding energy and monitor.
    pub counters: CounterColumns,
    /// Elastic-line calibration.
    pub calibration: CalibrationConfig,
    /// Resampling.
    pub resample: ResampleConfig,
    /// Units of momentum transfer.
    pub q_units: QUnits,
}

impl ReductionConfig {
    /// Set the integration configuration.
    #[must_use]
    pub fn with_integration(mut self, integration: IntegrationConfig) -> Self {
        self.integration = integration;
        self
    }

    /// Set the counter columns.
    #[must_use]
    pub fn with_counters(mut self, counters: CounterColumns) -> Self {
        self.counters = counters;
        self
    }

    /// Set the calibration configuration.
    #[must_use]
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    /// Set the resampling configuration.
    #[must_use]
    pub fn with_resample(mut self, resample: ResampleConfig) -> Self {
        self.resample = resample;
        self
    }

    /// Set the momentum-transfer units.
    #[must_use]
    pub fn with_q_units(mut self, units: QUnits) -> Self {
        self.q_units = units;
        self
    }
}

/// One reduction run over a fixed ROI set.
#[derive(Debug)]
pub struct Reduction {
    rois: RoiSet,
    config: ReductionConfig,
    registry: ScanRegistry,
    aggregation: Option<AggregationReport>,
    calibration: Option<Arc<Calibration>>,
    calibration_scans: Vec<u32>,
    spectrum: Option<Spectrum>,
    q_table: Option<QTable>,
}

impl Reduction {
    /// Starts a run.
    #[must_use]
    pub fn new(rois: RoiSet, config: ReductionConfig) -> Self {
        Self {
            rois,
            config,
            registry: ScanRegistry::new(),
            aggregation: None,
            calibration: None,
            calibration_scans: Vec::new(),
            spectrum: None,
            q_table: None,
        }
    }

    /// ROI set of the run.
    #[must_use]
    pub fn rois(&self) -> &RoiSet {
        &self.rois
    }

    /// Configuration of the run.
    #[must_use]
    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    /// Registered scans.
    #[must_use]
    pub fn registry(&self) -> &ScanRegistry {
        &self.registry
    }

    /// Current pipeline stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        if self.calibration.is_none() {
            Stage::Uncalibrated
        } else if self.q_table.is_some() {
            Stage::GeometryResolved
        } else if self.spectrum.is_some() {
            Stage::Resampled
        } else {
            Stage::Calibrated
        }
    }

    /// Integrates `frames` and registers the resulting scan.
    ///
    /// Changing the registry discards aggregated groups and derived outputs.
    /// The current calibration is kept.
    pub fn load_scan(
        &mut self,
        number: u32,
        label: ScanLabel,
        frames: &[RawFrame],
        counters: &CounterTable,
    ) -> Result<&Scan> {
        let scan = build_scan(
            number,
            label,
            frames,
            counters,
            &self.config.counters,
            &self.rois,
            &self.config.integration,
        )?;
        self.insert_scan(scan)?;
        self.registry.get(number).ok_or(Error::UnknownScan(number))
    }

    /// Registers an already built scan.
    pub fn insert_scan(&mut self, scan: Scan) -> Result<()> {
        if scan.num_channels() != self.rois.num_channels() {
            return Err(Error::LengthMismatch {
                what: "scan channels",
                expected: self.rois.num_channels(),
                actual: scan.num_channels(),
            });
        }
        self.registry.insert(scan)?;
        self.invalidate();
        Ok(())
    }

    /// Removes a scan from the run.
    ///
    /// Dropping a scan the current calibration was derived from leaves the
    /// calibration in place; call [`Reduction::calibrate`] again to replace it.
    pub fn drop_scan(&mut self, number: u32) -> Result<Scan> {
        let scan = self.registry.drop_scan(number)?;
        if self.calibration_scans.contains(&number) {
            log::warn!(
                "scan {number} was used for the current calibration; recalibrate to exclude it"
            );
        }
        self.invalidate();
        Ok(scan)
    }

    fn invalidate(&mut self) {
        self.aggregation = None;
        self.spectrum = None;
        self.q_table = None;
    }

    /// Aggregates every label; failing labels are reported, not fatal.
    pub fn aggregate(&mut self) -> &AggregationReport {
        self.aggregation
            .get_or_insert_with(|| aggregate_registry(&self.registry))
    }

    /// Aggregated groups, aggregating first if needed.
    pub fn groups(&mut self) -> &BTreeMap<ScanLabel, Group> {
        &self.aggregate().groups
    }

    /// Per-label aggregation failures of the last aggregation.
    #[must_use]
    pub fn failures(&self) -> &[AggregationError] {
        self.aggregation
            .as_ref()
            .map(|report| report.failures.as_slice())
            .unwrap_or_default()
    }

    /// Derives a new calibration from the elastic group.
    ///
    /// If the elastic scans could not be combined, their aggregation error is
    /// returned. Outputs derived from a previous calibration are discarded
    /// from the session; spectra already handed out keep their own
    /// calibration.
    pub fn calibrate(&mut self) -> Result<Arc<Calibration>> {
        let report = self
            .aggregation
            .get_or_insert_with(|| aggregate_registry(&self.registry));
        if let Some(failure) = report.failure(&self.config.calibration.elastic_label) {
            return Err(failure.clone().into());
        }
        let calibration = Arc::new(calibrate(&report.groups, &self.config.calibration)?);
        self.calibration_scans = report
            .group(&self.config.calibration.elastic_label)
            .map(|group| group.members().to_vec())
            .unwrap_or_default();
        self.calibration = Some(Arc::clone(&calibration));
        self.spectrum = None;
        self.q_table = None;
        Ok(calibration)
    }

    /// Current calibration.
    #[must_use]
    pub fn calibration(&self) -> Option<&Arc<Calibration>> {
        self.calibration.as_ref()
    }

    /// Elastic scans the current calibration was derived from.
    #[must_use]
    pub fn calibration_scans(&self) -> &[u32] {
        &self.calibration_scans
    }

    /// Returns true if a scan behind the current calibration is no longer
    /// registered.
    #[must_use]
    pub fn calibration_is_stale(&self) -> bool {
        self.calibration_scans
            .iter()
            .any(|&number| self.registry.get(number).is_none())
    }

    fn require_calibration(&self) -> Result<Arc<Calibration>> {
        self.calibration.clone().ok_or(Error::Precondition {
            required: Stage::Calibrated,
            current: self.stage(),
        })
    }

    /// Resamples every group into one energy-ordered spectrum.
    pub fn resample(&mut self) -> Result<&Spectrum> {
        let calibration = self.require_calibration()?;
        let report = self
            .aggregation
            .get_or_insert_with(|| aggregate_registry(&self.registry));
        let spectrum =
            assemble_spectrum(report.groups.values(), &calibration, &self.config.resample)?;
        Ok(self.spectrum.insert(spectrum))
    }

    /// Resamples the group of one label.
    pub fn resample_label(&mut self, label: &ScanLabel) -> Result<Spectrum> {
        let calibration = self.require_calibration()?;
        let config = self.config.resample.clone();
        let group = self
            .groups()
            .get(label)
            .ok_or_else(|| Error::MissingGroup(label.to_string()))?;
        resample_group(group, &calibration, &config)
    }

    /// Resamples every registered scan individually, in scan-number order.
    pub fn resample_scans(&self) -> Result<Vec<Scan>> {
        let calibration = self.require_calibration()?;
        self.registry
            .iter()
            .map(|scan| resample_scan(scan, &calibration, &self.config.resample))
            .collect()
    }

    /// Last assembled spectrum.
    #[must_use]
    pub fn spectrum(&self) -> Option<&Spectrum> {
        self.spectrum.as_ref()
    }

    /// Computes momentum transfer for every channel along the shared axis.
    ///
    /// The axis is the one of the last resampled spectrum, or the assembled
    /// energy axis of all groups if nothing has been resampled yet.
    pub fn resolve_geometry<G: ScatteringGeometry + ?Sized>(
        &mut self,
        geometry: &G,
    ) -> Result<&QTable> {
        let calibration = self.require_calibration()?;
        let eloss = if let Some(spectrum) = &self.spectrum {
            spectrum.eloss().to_vec()
        } else {
            let channels = calibration.num_channels();
            let assembled = assemble(self.aggregate().groups.values(), channels)?;
            calibration.eloss_axis(&assembled.energy)
        };
        let table = resolve_geometry(geometry, &eloss, &calibration, self.config.q_units)?;
        Ok(self.q_table.insert(table))
    }

    /// Last momentum-transfer table.
    #[must_use]
    pub fn q_table(&self) -> Option<&QTable> {
        self.q_table.as_ref()
    }
}
