//! ROI integration of raw detector frames and scan construction.

use ndarray::Array2;
use rayon::prelude::*;
use xrsred_core::counters::{CounterColumns, CounterTable};
use xrsred_core::error::{Error, Result};
use xrsred_core::pixel::RawFrame;
use xrsred_core::roi::RoiSet;
use xrsred_core::scan::{Scan, ScanLabel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for frame integration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegrationConfig {
    /// Integrate the frames of a scan in parallel.
    pub parallel: bool,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl IntegrationConfig {
    /// Set whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Integrated intensity of every channel for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelIntensities {
    /// Sum of pixel values inside each ROI.
    pub signal: Vec<f64>,
    /// Poisson error, `sqrt(signal)`.
    pub error: Vec<f64>,
}

/// Sums the pixels of every ROI in `frame`.
///
/// The frame must have the detector shape the ROI set was validated against.
pub fn integrate_frame(frame: &RawFrame, rois: &RoiSet) -> Result<ChannelIntensities> {
    let shape = rois.shape();
    let actual = frame.shape();
    if actual != shape {
        return Err(Error::FrameShapeMismatch {
            height: shape.height,
            width: shape.width,
            actual_height: actual.height,
            actual_width: actual.width,
        });
    }

    let pixels = frame.view();
    let signal: Vec<f64> = rois
        .iter()
        .map(|roi| roi.iter().map(|p| pixels[[p.row(), p.col()]]).sum())
        .collect();
    let error = signal.iter().map(|s: &f64| s.sqrt()).collect();
    Ok(ChannelIntensities { signal, error })
}

/// Integrates a sequence of frames into `points x channels` signal and error arrays.
pub fn integrate_frames(
    frames: &[RawFrame],
    rois: &RoiSet,
    config: &IntegrationConfig,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let per_frame: Vec<ChannelIntensities> = if config.parallel {
        frames
            .par_iter()
            .map(|frame| integrate_frame(frame, rois))
            .collect::<Result<_>>()?
    } else {
        frames
            .iter()
            .map(|frame| integrate_frame(frame, rois))
            .collect::<Result<_>>()?
    };

    let channels = rois.num_channels();
    let mut signals = Array2::zeros((frames.len(), channels));
    let mut errors = Array2::zeros((frames.len(), channels));
    for (point, intensities) in per_frame.iter().enumerate() {
        for channel in 0..channels {
            signals[[point, channel]] = intensities.signal[channel];
            errors[[point, channel]] = intensities.error[channel];
        }
    }
    Ok((signals, errors))
}

/// Builds a scan from its frames and counter table.
///
/// Signals are raw integrated counts; the monitor is stored alongside
/// for later normalization.
pub fn build_scan(
    number: u32,
    label: ScanLabel,
    frames: &[RawFrame],
    counters: &CounterTable,
    columns: &CounterColumns,
    rois: &RoiSet,
    config: &IntegrationConfig,
) -> Result<Scan> {
    let energy = columns.energy(counters)?;
    let monitor = columns.monitor(counters)?;
    if frames.len() != energy.len() {
        return Err(Error::LengthMismatch {
            what: "frames per counter row",
            expected: energy.len(),
            actual: frames.len(),
        });
    }

    let (signals, errors) = integrate_frames(frames, rois, config)?;
    let scan = Scan::new(number, label, energy, monitor, signals, errors)?;
    log::debug!(
        "integrated scan {} ({}): {} points, {} channels",
        scan.number(),
        scan.label(),
        scan.len(),
        scan.num_channels()
    );
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrsred_core::pixel::{DetectorShape, PixelCoord};
    use xrsred_core::roi::Roi;

    fn rois() -> RoiSet {
        RoiSet::new(
            vec![
                Roi::rectangle(0, 0, 2, 2),
                Roi::new(vec![PixelCoord::new(3, 3)]),
                Roi::rectangle(2, 0, 2, 1),
            ],
            DetectorShape::new(4, 4),
        )
        .unwrap()
    }

    fn frame(scale: f64) -> RawFrame {
        let values = (0..16).map(|v| f64::from(v) * scale).collect();
        RawFrame::from_shape_vec(4, 4, values).unwrap()
    }

    #[test]
    fn test_integrate_frame() {
        let result = integrate_frame(&frame(1.0), &rois()).unwrap();
        // (0,0)=0 (1,0)=1 (0,1)=4 (1,1)=5
        assert_eq!(result.signal, vec![10.0, 15.0, 5.0]);
        assert_eq!(result.error[1], 15f64.sqrt());
    }

    #[test]
    fn test_zero_signal_zero_error() {
        let result = integrate_frame(&RawFrame::zeros(DetectorShape::new(4, 4)), &rois()).unwrap();
        assert!(result.signal.iter().all(|&s| s == 0.0));
        assert!(result.error.iter().all(|&e| e == 0.0 && !e.is_nan()));
    }

    #[test]
    fn test_frame_shape_mismatch() {
        let small = RawFrame::zeros(DetectorShape::new(3, 4));
        assert!(matches!(
            integrate_frame(&small, &rois()),
            Err(Error::FrameShapeMismatch {
                actual_height: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let frames: Vec<RawFrame> = (1..=5).map(|s| frame(f64::from(s))).collect();
        let sequential = IntegrationConfig::default().with_parallel(false);
        let seq = integrate_frames(&frames, &rois(), &sequential).unwrap();
        let par = integrate_frames(&frames, &rois(), &IntegrationConfig::default()).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq.0.dim(), (5, 3));
    }

    #[test]
    fn test_build_scan_checks_frame_count() {
        let counters = CounterTable::new()
            .with_column("energy_cc", vec![10.0, 10.1])
            .unwrap()
            .with_column("monitor", vec![1.0, 1.0])
            .unwrap();
        let err = build_scan(
            1,
            ScanLabel::elastic(),
            &[frame(1.0)],
            &counters,
            &CounterColumns::default(),
            &rois(),
            &IntegrationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_build_scan_keeps_raw_counts() {
        let counters = CounterTable::new()
            .with_column("energy_cc", vec![10.0, 10.1])
            .unwrap()
            .with_column("monitor", vec![2.0, 4.0])
            .unwrap();
        let scan = build_scan(
            1,
            ScanLabel::elastic(),
            &[frame(1.0), frame(2.0)],
            &counters,
            &CounterColumns::default(),
            &rois(),
            &IntegrationConfig::default(),
        )
        .unwrap();
        assert_eq!(scan.signals()[[1, 0]], 20.0);
        assert_eq!(scan.monitor(), &[2.0, 4.0]);
    }
}
