//! Owned collection of the scans of one reduction run.

use crate::error::{Error, Result};
use crate::scan::{Scan, ScanLabel};
use std::collections::BTreeMap;

/// Scans indexed by scan number.
///
/// Every registered scan must have the channel count of the first one.
/// Iteration is always in ascending scan-number order.
#[derive(Debug, Clone, Default)]
pub struct ScanRegistry {
    scans: BTreeMap<u32, Scan>,
}

impl ScanRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scan. Scan numbers are unique.
    pub fn insert(&mut self, scan: Scan) -> Result<()> {
        if self.scans.contains_key(&scan.number()) {
            return Err(Error::DuplicateScan(scan.number()));
        }
        if let Some(channels) = self.num_channels() {
            if scan.num_channels() != channels {
                return Err(Error::LengthMismatch {
                    what: "scan channels",
                    expected: channels,
                    actual: scan.num_channels(),
                });
            }
        }
        self.scans.insert(scan.number(), scan);
        Ok(())
    }

    /// Removes a scan from the run and returns it.
    pub fn drop_scan(&mut self, number: u32) -> Result<Scan> {
        self.scans.remove(&number).ok_or(Error::UnknownScan(number))
    }

    /// Looks up a scan.
    #[must_use]
    pub fn get(&self, number: u32) -> Option<&Scan> {
        self.scans.get(&number)
    }

    /// Number of registered scans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    /// Returns true if no scans are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    /// Channel count shared by all scans, if any are registered.
    #[must_use]
    pub fn num_channels(&self) -> Option<usize> {
        self.scans.values().next().map(Scan::num_channels)
    }

    /// Registered scan numbers in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.scans.keys().copied()
    }

    /// Scans in ascending scan-number order.
    pub fn iter(&self) -> impl Iterator<Item = &Scan> {
        self.scans.values()
    }

    /// Scans carrying `label`, in scan-number order.
    pub fn with_label<'a>(&'a self, label: &'a ScanLabel) -> impl Iterator<Item = &'a Scan> {
        self.scans.values().filter(move |scan| scan.label() == label)
    }

    /// Scans partitioned by label; labels sorted, members in scan-number order.
    #[must_use]
    pub fn by_label(&self) -> BTreeMap<&ScanLabel, Vec<&Scan>> {
        let mut groups: BTreeMap<&ScanLabel, Vec<&Scan>> = BTreeMap::new();
        for scan in self.scans.values() {
            groups.entry(scan.label()).or_default().push(scan);
        }
        groups
    }
}

/// Labels for repeated scan loops.
///
/// Each loop starts at one of `first_numbers` and consists of `regions`
/// consecutive scans labelled `edge1` to `edge{regions}`. A loop is cut
/// short where its scan numbers would pass `u32::MAX`.
#[must_use]
pub fn loop_labels(first_numbers: &[u32], regions: usize) -> Vec<(u32, ScanLabel)> {
    first_numbers
        .iter()
        .flat_map(|&first| {
            (0..regions).map_while(move |region| {
                let number = first.checked_add(u32::try_from(region).ok()?)?;
                Some((number, ScanLabel::edge(region + 1)))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn scan(number: u32, label: &str, channels: usize) -> Scan {
        Scan::from_counts(
            number,
            ScanLabel::new(label),
            vec![1.0, 2.0],
            vec![1.0, 1.0],
            Array2::ones((2, channels)),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ScanRegistry::new();
        registry.insert(scan(5, "elastic", 3)).unwrap();
        assert!(matches!(
            registry.insert(scan(5, "edge1", 3)),
            Err(Error::DuplicateScan(5))
        ));
    }

    #[test]
    fn test_channel_count_fixed() {
        let mut registry = ScanRegistry::new();
        registry.insert(scan(1, "elastic", 3)).unwrap();
        assert!(matches!(
            registry.insert(scan(2, "elastic", 4)),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_partition_in_scan_order() {
        let mut registry = ScanRegistry::new();
        registry.insert(scan(9, "edge1", 2)).unwrap();
        registry.insert(scan(3, "elastic", 2)).unwrap();
        registry.insert(scan(4, "edge1", 2)).unwrap();

        let groups = registry.by_label();
        let edge: Vec<u32> = groups[&ScanLabel::edge(1)]
            .iter()
            .map(|s| s.number())
            .collect();
        assert_eq!(edge, vec![4, 9]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_drop_scan() {
        let mut registry = ScanRegistry::new();
        registry.insert(scan(1, "long", 2)).unwrap();
        assert_eq!(registry.drop_scan(1).unwrap().number(), 1);
        assert!(registry.is_empty());
        assert!(matches!(registry.drop_scan(1), Err(Error::UnknownScan(1))));
    }

    #[test]
    fn test_loop_labels() {
        let labels = loop_labels(&[100, 110], 3);
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], (100, ScanLabel::edge(1)));
        assert_eq!(labels[2], (102, ScanLabel::edge(3)));
        assert_eq!(labels[3], (110, ScanLabel::edge(1)));
    }

    #[test]
    fn test_loop_labels_stop_at_last_scan_number() {
        let labels = loop_labels(&[u32::MAX - 1], 4);
        assert_eq!(
            labels,
            vec![
                (u32::MAX - 1, ScanLabel::edge(1)),
                (u32::MAX, ScanLabel::edge(2))
            ]
        );
    }

    #[test]
    fn test_with_label() {
        let mut registry = ScanRegistry::new();
        registry.insert(scan(8, "elastic", 2)).unwrap();
        registry.insert(scan(2, "edge1", 2)).unwrap();
        registry.insert(scan(5, "elastic", 2)).unwrap();

        let elastic = ScanLabel::elastic();
        let numbers: Vec<u32> = registry.with_label(&elastic).map(Scan::number).collect();
        assert_eq!(numbers, vec![5, 8]);
        assert_eq!(registry.with_label(&ScanLabel::new("long")).count(), 0);
    }
}
