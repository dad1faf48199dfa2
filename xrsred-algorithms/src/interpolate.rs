//! Bounded linear interpolation.
//!
//! Samples are bracketed by two zero-valued guard samples at `-inf` and
//! `+inf`. Any query that falls in a guard segment evaluates to exactly zero,
//! so nothing is extrapolated beyond the observed domain.

/// Piecewise-linear interpolant over samples sorted by abscissa.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLinear {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl BoundedLinear {
    /// Value carried by the guard samples.
    pub const FILL: f64 = 0.0;

    /// Builds the interpolant. Samples are stably sorted by `x`; pairs with
    /// a NaN abscissa are discarded.
    #[must_use]
    pub fn new(x: &[f64], y: &[f64]) -> Self {
        let mut samples: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter(|(xi, _)| !xi.is_nan())
            .map(|(&xi, &yi)| (xi, yi))
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut xs = Vec::with_capacity(samples.len() + 2);
        let mut ys = Vec::with_capacity(samples.len() + 2);
        xs.push(f64::NEG_INFINITY);
        ys.push(Self::FILL);
        for (xi, yi) in samples {
            xs.push(xi);
            ys.push(yi);
        }
        xs.push(f64::INFINITY);
        ys.push(Self::FILL);
        Self { x: xs, y: ys }
    }

    /// Number of real samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len() - 2
    }

    /// Returns true if there are no real samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closed interval covered by the real samples.
    #[must_use]
    pub fn domain(&self) -> Option<(f64, f64)> {
        (!self.is_empty()).then(|| (self.x[1], self.x[self.x.len() - 2]))
    }

    /// Value at `at`; exactly the sample value on a sample abscissa and
    /// [`Self::FILL`] outside the domain.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn eval(&self, at: f64) -> f64 {
        if at.is_nan() {
            return Self::FILL;
        }
        // x[0] is -inf, so at least one sample is <= at
        let upper = self.x.partition_point(|&xi| xi <= at);
        let lo = upper - 1;
        if self.x[lo] == at {
            return self.y[lo];
        }
        let hi = upper;
        let (x0, x1) = (self.x[lo], self.x[hi]);
        if x0.is_infinite() || x1.is_infinite() {
            return Self::FILL;
        }
        let t = (at - x0) / (x1 - x0);
        self.y[lo] + t * (self.y[hi] - self.y[lo])
    }

    /// Evaluates at every point of `at`.
    #[must_use]
    pub fn eval_many(&self, at: &[f64]) -> Vec<f64> {
        at.iter().map(|&a| self.eval(a)).collect()
    }
}
