#![allow(clippy::cast_precision_loss)]
use approx::assert_relative_eq;
use ndarray::Array2;
use std::sync::Arc;
use xrsred_algorithms::{
    aggregate, calibrate_group, integrate_frame, momentum_transfer, q_table, resample_group,
    BoundedLinear, CalibrationConfig, QUnits, ResampleConfig,
};
use xrsred_core::{
    AggregationError, Calibration, DetectorShape, Group, PixelCoord, RawFrame, Resolution, Roi,
    RoiSet, Scan, ScanLabel,
};

fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

fn gaussian(x: &[f64], center: f64, fwhm: f64) -> Vec<f64> {
    let sigma = fwhm / (8.0 * 2f64.ln()).sqrt();
    x.iter()
        .map(|xi| {
            let z = (xi - center) / sigma;
            500.0 * (-0.5 * z * z).exp()
        })
        .collect()
}

fn elastic_scan(number: u32, points: usize) -> Scan {
    let energy = axis(9.995, 0.001, points);
    let line = gaussian(&energy, 10.0, 0.002);
    let signals = Array2::from_shape_fn((points, 3), |(p, _)| line[p]);
    Scan::from_counts(number, ScanLabel::elastic(), energy, vec![1.0; points], signals).unwrap()
}

#[test]
fn test_integrated_error_is_sqrt_of_signal() {
    let shape = DetectorShape::new(8, 8);
    let rois = RoiSet::new(
        vec![
            Roi::rectangle(0, 0, 4, 4),
            Roi::rectangle(4, 4, 4, 4),
            Roi::new(vec![PixelCoord::new(7, 0), PixelCoord::new(0, 7)]),
        ],
        shape,
    )
    .unwrap();
    for seed in 0..5_u32 {
        let values = (0..64)
            .map(|i| f64::from((i * 7 + seed * 13) % 11) * f64::from(seed))
            .collect();
        let frame = RawFrame::from_shape_vec(8, 8, values).unwrap();
        let result = integrate_frame(&frame, &rois).unwrap();
        for (signal, error) in result.signal.iter().zip(&result.error) {
            assert!(*signal >= 0.0);
            assert_eq!(*error, signal.sqrt());
        }
    }
}

#[test]
fn test_two_identical_elastic_scans() {
    let a = elastic_scan(1, 11);
    let b = elastic_scan(2, 11);
    let group = aggregate(&ScanLabel::elastic(), &[&a, &b]).unwrap();
    for ((summed, single), (err, single_err)) in group
        .signals()
        .iter()
        .zip(a.signals())
        .zip(group.errors().iter().zip(a.errors()))
    {
        assert_relative_eq!(*summed, 2.0 * single, max_relative = 1e-12);
        assert_relative_eq!(*err, 2f64.sqrt() * single_err, max_relative = 1e-12);
    }
}

#[test]
fn test_point_count_mismatch_never_truncates() {
    let a = elastic_scan(1, 11);
    let b = elastic_scan(2, 10);
    let result = aggregate(&ScanLabel::elastic(), &[&a, &b]);
    assert!(matches!(
        result,
        Err(AggregationError::PointCountMismatch { scan: 2, .. })
    ));
}

#[test]
fn test_centroid_and_fwhm_recovery() {
    let energy = axis(9.98, 0.0002, 201);
    let line = gaussian(&energy, 10.0021, 0.0025);
    let group = Group::from_parts(
        ScanLabel::elastic(),
        vec![1],
        energy.clone(),
        vec![1.0; energy.len()],
        Array2::from_shape_fn((energy.len(), 1), |(p, _)| line[p]),
        Array2::zeros((energy.len(), 1)),
    )
    .unwrap();
    let calibration = calibrate_group(&group, &CalibrationConfig::default()).unwrap();
    assert_relative_eq!(calibration.centroids()[0], 10.0021, epsilon = 1e-8);
    // 2.5 eV width sampled every 0.2 eV
    assert_relative_eq!(calibration.resolution()[0].value(), 2.5, max_relative = 1e-2);
}

fn shifted_group(energy: &[f64], signal: &[f64]) -> Group {
    let points = energy.len();
    Group::from_parts(
        ScanLabel::edge(1),
        vec![1],
        energy.to_vec(),
        vec![1.0; points],
        Array2::from_shape_fn((points, 2), |(p, _)| signal[p]),
        Array2::from_shape_fn((points, 2), |(p, _)| signal[p].sqrt()),
    )
    .unwrap()
}

#[test]
fn test_resampling_idempotent_on_shared_axis() {
    let energy = axis(9.9, 0.01, 21);
    let signal: Vec<f64> = energy.iter().map(|e| (e - 9.0) * 50.0).collect();
    let group = shifted_group(&energy, &signal);
    let calibration = Arc::new(
        Calibration::new(
            vec![10.0, 10.0],
            vec![Resolution::Measured(1.0); 2],
            0,
            1000.0,
        )
        .unwrap(),
    );
    let config = ResampleConfig::default();
    let once = resample_group(&group, &calibration, &config).unwrap();
    assert_eq!(once.signals(), group.signals());

    let again = Group::from_parts(
        ScanLabel::edge(1),
        vec![1],
        once.energy().to_vec(),
        vec![1.0; once.len()],
        once.signals().to_owned(),
        once.errors().to_owned(),
    )
    .unwrap();
    let twice = resample_group(&again, &calibration, &config).unwrap();
    assert_eq!(twice.signals(), once.signals());
    assert_eq!(twice.errors(), once.errors());
}

#[test]
fn test_resampling_outside_domain_is_zero() {
    let energy = axis(9.9, 0.01, 21);
    let signal = vec![7.0; energy.len()];
    let group = shifted_group(&energy, &signal);
    // channel 1 sees the same points 50 eV higher in loss
    let calibration = Arc::new(
        Calibration::new(
            vec![10.0, 9.95],
            vec![Resolution::Measured(1.0); 2],
            0,
            1000.0,
        )
        .unwrap(),
    );
    let spectrum = resample_group(&group, &calibration, &ResampleConfig::default()).unwrap();
    let channel = spectrum.channel_signal(1).unwrap();
    for (eloss, value) in spectrum.eloss().iter().zip(channel) {
        if *eloss < -50.0 - 1e-6 {
            assert_eq!(*value, 0.0);
        } else if *eloss > -50.0 + 1e-6 {
            assert_relative_eq!(*value, 7.0, max_relative = 1e-9);
        }
    }
    // errors follow the same domain
    assert_eq!(spectrum.errors()[[0, 1]], 0.0);
    assert_relative_eq!(spectrum.errors()[[spectrum.len() - 1, 1]], 7f64.sqrt());
}

#[test]
fn test_interpolant_never_extrapolates_trend() {
    let x = axis(0.0, 1.0, 5);
    let y: Vec<f64> = x.iter().map(|v| 10.0 + 3.0 * v).collect();
    let f = BoundedLinear::new(&x, &y);
    assert_eq!(f.eval(5.0), 0.0);
    assert_eq!(f.eval(-0.5), 0.0);
    assert_relative_eq!(f.eval(4.0), 22.0);
}

#[test]
fn test_q_monotonic_in_energy_loss() {
    let calibration = Calibration::new(
        vec![9.7, 9.7, 9.7],
        vec![Resolution::Measured(1.0); 3],
        0,
        1000.0,
    )
    .unwrap();
    let eloss = axis(0.0, 5.0, 400);
    let table = q_table(&eloss, &calibration, &[15.0, 90.0, 170.0], QUnits::InverseAngstrom)
        .unwrap();
    for channel in 0..3 {
        let q = table.channel(channel).unwrap().to_vec();
        assert!(q.windows(2).all(|w| w[1] >= w[0]));
    }
    assert_relative_eq!(
        table.values()[[0, 1]],
        momentum_transfer(9.7, 9.7, 90.0, QUnits::InverseAngstrom),
        epsilon = 1e-12
    );
}
