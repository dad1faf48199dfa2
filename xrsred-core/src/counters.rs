//! Per-point instrument counters.

use crate::error::{Error, Result};
use crate::units::{energy_from_bragg_angle, SI_311_D_SPACING};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named counter columns aligned by scan point.
///
/// Column names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "CounterTableParts")
)]
pub struct CounterTable {
    columns: BTreeMap<String, Vec<f64>>,
    len: Option<usize>,
}

impl CounterTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column; every column must have the same length.
    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if let Some(expected) = self.len {
            if values.len() != expected {
                return Err(Error::LengthMismatch {
                    what: "counter column",
                    expected,
                    actual: values.len(),
                });
            }
        }
        self.len = Some(values.len());
        self.columns.insert(name.to_lowercase(), values);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    /// Values of one column.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingCounter(name.to_string()))
    }

    /// Number of scan points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.unwrap_or(0)
    }

    /// Returns true if the table holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// Serialized form of a [`CounterTable`]; columns are re-inserted on the way in.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct CounterTableParts {
    columns: BTreeMap<String, Vec<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<CounterTableParts> for CounterTable {
    type Error = Error;

    fn try_from(parts: CounterTableParts) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in parts.columns {
            table.insert(&name, values)?;
        }
        Ok(table)
    }
}

/// Where the primary energy of a scan point comes from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EnergySource {
    /// Energy in keV recorded directly.
    Column(String),
    /// Monochromator Bragg angle in degrees, converted with `d_spacing` (Å).
    MonoAngle { column: String, d_spacing: f64 },
}

/// Selects the energy and monitor columns of a counter table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CounterColumns {
    /// Primary-energy source.
    pub energy: EnergySource,
    /// Monitor (normalization) column.
    pub monitor: String,
}

impl Default for CounterColumns {
    fn default() -> Self {
        Self {
            energy: EnergySource::Column("energy_cc".to_string()),
            monitor: "monitor".to_string(),
        }
    }
}

impl CounterColumns {
    /// Creates the default column selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads energy directly from `column`.
    #[must_use]
    pub fn with_energy_column(mut self, column: &str) -> Self {
        self.energy = EnergySource::Column(column.to_string());
        self
    }

    /// Derives energy from a Si(311) monochromator angle column.
    #[must_use]
    pub fn with_mono_angle(mut self, column: &str) -> Self {
        self.energy = EnergySource::MonoAngle {
            column: column.to_string(),
            d_spacing: SI_311_D_SPACING,
        };
        self
    }

    /// Sets the monitor column.
    #[must_use]
    pub fn with_monitor_column(mut self, column: &str) -> Self {
        self.monitor = column.to_string();
        self
    }

    /// Per-point energy in keV.
    pub fn energy(&self, table: &CounterTable) -> Result<Vec<f64>> {
        match &self.energy {
            EnergySource::Column(column) => Ok(table.column(column)?.to_vec()),
            EnergySource::MonoAngle { column, d_spacing } => Ok(table
                .column(column)?
                .iter()
                .map(|&angle| energy_from_bragg_angle(angle, *d_spacing))
                .collect()),
        }
    }

    /// Per-point monitor counts.
    pub fn monitor(&self, table: &CounterTable) -> Result<Vec<f64>> {
        Ok(table.column(&self.monitor)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> CounterTable {
        CounterTable::new()
            .with_column("Energy_cc", vec![9.99, 10.0, 10.01])
            .unwrap()
            .with_column("monitor", vec![1.0e5, 1.1e5, 0.9e5])
            .unwrap()
            .with_column("pmonoa", vec![80.0, 80.1, 80.2])
            .unwrap()
    }

    #[test]
    fn test_case_insensitive_columns() {
        let table = table();
        assert_eq!(table.column("ENERGY_CC").unwrap().len(), 3);
        assert_eq!(table.len(), 3);
        assert!(matches!(
            table.column("ccdno"),
            Err(Error::MissingCounter(_))
        ));
    }

    #[test]
    fn test_rejects_misaligned_column() {
        let mut table = table();
        let err = table.insert("extra", vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_mono_angle_energy() {
        let table = table();
        let columns = CounterColumns::new().with_mono_angle("pmonoa");
        let energy = columns.energy(&table).unwrap();
        assert_relative_eq!(
            energy[0],
            energy_from_bragg_angle(80.0, SI_311_D_SPACING),
            epsilon = 1e-12
        );
        // Larger Bragg angle selects lower energy.
        assert!(energy[2] < energy[0]);
    }

    #[test]
    fn test_custom_columns() {
        let table = table()
            .with_column("I0", vec![2.0, 3.0, 4.0])
            .unwrap()
            .with_column("mono_energy", vec![8.0, 8.5, 9.0])
            .unwrap();
        let columns = CounterColumns::new()
            .with_energy_column("mono_energy")
            .with_monitor_column("i0");
        assert_eq!(columns.energy(&table).unwrap(), vec![8.0, 8.5, 9.0]);
        assert_eq!(columns.monitor(&table).unwrap(), vec![2.0, 3.0, 4.0]);

        let missing = CounterColumns::new().with_monitor_column("kap4dio");
        assert!(matches!(
            missing.monitor(&table),
            Err(Error::MissingCounter(name)) if name == "kap4dio"
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_checks_alignment() {
        let ragged = r#"{"columns":{"energy_cc":[10.0,10.1],"monitor":[1.0]}}"#;
        assert!(serde_json::from_str::<CounterTable>(ragged).is_err());

        let restored: CounterTable =
            serde_json::from_str(&serde_json::to_string(&table()).unwrap()).unwrap();
        assert_eq!(restored, table());
    }
}
