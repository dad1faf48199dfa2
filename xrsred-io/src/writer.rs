//! File writers for reduced spectra.

use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use xrsred_core::{Calibration, QTable, ScanLabel, Spectrum};

/// Calibration and geometry of a reduction, as written to JSON.
#[derive(Debug, Serialize)]
pub struct ReductionSummary<'a> {
    /// Calibration record.
    pub calibration: &'a Calibration,
    /// Channels whose resolution could not be measured.
    pub degraded_channels: Vec<usize>,
    /// Labels of the groups in the spectrum, if one was reduced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<&'a [ScanLabel]>,
    /// Momentum-transfer table, if the geometry was resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_table: Option<&'a QTable>,
}

impl<'a> ReductionSummary<'a> {
    /// Summary of a calibration.
    #[must_use]
    pub fn new(calibration: &'a Calibration) -> Self {
        Self {
            calibration,
            degraded_channels: calibration.degraded_channels(),
            labels: None,
            q_table: None,
        }
    }

    /// Adds the group labels of a spectrum.
    #[must_use]
    pub fn with_spectrum(mut self, spectrum: &'a Spectrum) -> Self {
        self.labels = Some(spectrum.labels());
        self
    }

    /// Adds a momentum-transfer table; it must cover every calibrated channel.
    pub fn with_q_table(mut self, table: &'a QTable) -> Result<Self> {
        let expected = self.calibration.num_channels();
        if table.tth().len() != expected {
            return Err(xrsred_core::Error::LengthMismatch {
                what: "q-table channels",
                expected,
                actual: table.tth().len(),
            }
            .into());
        }
        self.q_table = Some(table);
        Ok(self)
    }
}

/// Writer for reduced spectra.
///
/// Writes spectra and q-tables as CSV and reduction summaries as JSON.
pub struct SpectrumWriter {
    writer: BufWriter<File>,
}

impl SpectrumWriter {
    /// Creates a new file writer.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes a spectrum as CSV.
    ///
    /// Columns: `eloss,energy`, then `signal_i,error_i` for every channel.
    pub fn write_spectrum_csv(&mut self, spectrum: &Spectrum) -> Result<()> {
        write!(self.writer, "eloss,energy")?;
        for channel in 0..spectrum.num_channels() {
            write!(self.writer, ",signal_{channel},error_{channel}")?;
        }
        writeln!(self.writer)?;

        let signals = spectrum.signals();
        let errors = spectrum.errors();
        for (point, (eloss, energy)) in spectrum.eloss().iter().zip(spectrum.energy()).enumerate() {
            write!(self.writer, "{eloss},{energy}")?;
            for channel in 0..spectrum.num_channels() {
                write!(
                    self.writer,
                    ",{},{}",
                    signals[[point, channel]],
                    errors[[point, channel]]
                )?;
            }
            writeln!(self.writer)?;
        }

        self.writer.flush()?;
        log::debug!(
            "wrote spectrum: {} points, {} channels",
            spectrum.len(),
            spectrum.num_channels()
        );
        Ok(())
    }

    /// Writes a q-table as CSV.
    ///
    /// Columns: `eloss`, then `q_i` for every channel. The first comment line
    /// records the units.
    pub fn write_q_table_csv(&mut self, table: &QTable) -> Result<()> {
        writeln!(self.writer, "# q in {}", table.units())?;
        write!(self.writer, "eloss")?;
        for channel in 0..table.tth().len() {
            write!(self.writer, ",q_{channel}")?;
        }
        writeln!(self.writer)?;

        for (eloss, row) in table.eloss().iter().zip(table.values().rows()) {
            write!(self.writer, "{eloss}")?;
            for q in row {
                write!(self.writer, ",{q}")?;
            }
            writeln!(self.writer)?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes a reduction summary as pretty-printed JSON.
    pub fn write_summary_json(&mut self, summary: &ReductionSummary<'_>) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, summary)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
