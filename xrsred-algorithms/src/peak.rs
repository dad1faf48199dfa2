//! Peak characterisation: trapezoidal integrals, centroids and FWHM.

/// Trapezoidal integral of `y` over `x`.
///
/// Extra samples in the longer slice are ignored.
#[must_use]
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

/// Centre of mass `∫x·y dx / ∫y dx`.
///
/// Returns `None` when the integral of `y` vanishes or is not finite.
#[must_use]
pub fn centroid(x: &[f64], y: &[f64]) -> Option<f64> {
    let norm = trapezoid(x, y);
    if !norm.is_finite() || norm.abs() < f64::MIN_POSITIVE {
        return None;
    }
    let weighted: Vec<f64> = x.iter().zip(y).map(|(xi, yi)| xi * yi).collect();
    Some(trapezoid(x, &weighted) / norm)
}

/// Full width at half maximum of a single peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fwhm {
    /// Distance between the two half-maximum crossings.
    pub width: f64,
    /// Midpoint of the two crossings.
    pub center: f64,
    /// Peak height.
    pub height: f64,
}

/// Width of the highest peak of `y`, with half-maximum crossings located by
/// linear interpolation between samples.
///
/// Returns `None` if the peak is not positive or if either side of it never
/// drops to half maximum within the samples.
#[must_use]
pub fn fwhm(x: &[f64], y: &[f64]) -> Option<Fwhm> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let (x, y) = if x[0] > x[n - 1] {
        (
            x[..n].iter().rev().copied().collect::<Vec<_>>(),
            y[..n].iter().rev().copied().collect::<Vec<_>>(),
        )
    } else {
        (x[..n].to_vec(), y[..n].to_vec())
    };

    let mut peak = 0;
    for (i, value) in y.iter().enumerate() {
        if *value > y[peak] {
            peak = i;
        }
    }
    let height = y[peak];
    if !height.is_finite() || height <= 0.0 {
        return None;
    }
    let half = 0.5 * height;

    let left = (0..peak).rev().find(|&i| y[i] <= half)?;
    let right = (peak + 1..n).find(|&i| y[i] <= half)?;
    let x1 = crossing(x[left], y[left], x[left + 1], y[left + 1], half);
    let x2 = crossing(x[right - 1], y[right - 1], x[right], y[right], half);

    Some(Fwhm {
        width: x2 - x1,
        center: 0.5 * (x1 + x2),
        height,
    })
}

fn crossing(xa: f64, ya: f64, xb: f64, yb: f64, level: f64) -> f64 {
    let dy = yb - ya;
    if dy.abs() < f64::MIN_POSITIVE {
        0.5 * (xa + xb)
    } else {
        xa + (level - ya) * (xb - xa) / dy
    }
}
