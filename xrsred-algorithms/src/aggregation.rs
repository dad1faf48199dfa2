//! Combining scans that share a label.

use ndarray::ArrayView1;
use std::collections::BTreeMap;
use xrsred_core::error::AggregationError;
use xrsred_core::group::Group;
use xrsred_core::registry::ScanRegistry;
use xrsred_core::scan::{Scan, ScanLabel};

/// Outcome of aggregating every label in a registry.
///
/// A failing label does not prevent the other labels from being combined.
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Successfully combined groups, by label.
    pub groups: BTreeMap<ScanLabel, Group>,
    /// One entry per label that could not be combined.
    pub failures: Vec<AggregationError>,
}

impl AggregationReport {
    /// Group for `label`, if it was combined.
    #[must_use]
    pub fn group(&self, label: &ScanLabel) -> Option<&Group> {
        self.groups.get(label)
    }

    /// Failure recorded for `label`, if it could not be combined.
    #[must_use]
    pub fn failure(&self, label: &ScanLabel) -> Option<&AggregationError> {
        self.failures
            .iter()
            .find(|failure| failure.label() == label.as_str())
    }

    /// Returns true if every label was combined.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sums the scans of one label into a group.
///
/// The first scan provides the energy axis. Every other scan must have the
/// same number of points and channels; signals and monitors are summed and
/// errors are combined in quadrature.
pub fn aggregate(label: &ScanLabel, scans: &[&Scan]) -> Result<Group, AggregationError> {
    let (first, rest) = scans
        .split_first()
        .ok_or_else(|| AggregationError::EmptyGroup(label.to_string()))?;

    let mut signals = first.signals().to_owned();
    let mut variance = first.errors().mapv(|e| e * e);
    let mut monitor = ArrayView1::from(first.monitor()).to_owned();
    let mut members = Vec::with_capacity(scans.len());
    members.push(first.number());

    for scan in rest {
        if scan.len() != first.len() {
            return Err(AggregationError::PointCountMismatch {
                label: label.to_string(),
                scan: scan.number(),
                reference: first.number(),
                expected: first.len(),
                actual: scan.len(),
            });
        }
        if scan.num_channels() != first.num_channels() {
            return Err(AggregationError::ChannelCountMismatch {
                label: label.to_string(),
                scan: scan.number(),
                expected: first.num_channels(),
                actual: scan.num_channels(),
            });
        }
        signals += &scan.signals();
        variance += &scan.errors().mapv(|e| e * e);
        monitor += &ArrayView1::from(scan.monitor());
        members.push(scan.number());
    }

    Group::from_parts(
        label.clone(),
        members,
        first.energy().to_vec(),
        monitor.to_vec(),
        signals,
        variance.mapv(f64::sqrt),
    )
    .map_err(|err| AggregationError::InconsistentShape {
        label: label.to_string(),
        reason: err.to_string(),
    })
}

/// Aggregates every label of the registry, in scan-number order.
pub fn aggregate_registry(registry: &ScanRegistry) -> AggregationReport {
    let mut report = AggregationReport::default();
    for (label, scans) in registry.by_label() {
        match aggregate(label, &scans) {
            Ok(group) => {
                log::debug!(
                    "aggregated '{}': {} scans, {} points",
                    label,
                    group.members().len(),
                    group.len()
                );
                report.groups.insert(label.clone(), group);
            }
            Err(err) => {
                log::warn!("skipping group '{label}': {err}");
                report.failures.push(err);
            }
        }
    }
    report
}
