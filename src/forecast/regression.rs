//! Ordinary least squares over one series.

use thiserror::Error;

/// Regression errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Fewer than two points.
    #[error("insufficient data: {0} point(s), at least 2 required")]
    InsufficientData(usize),
    /// Every point shares the same time, the slope is undefined.
    #[error("degenerate regression: zero variance in time over {0} points")]
    Degenerate(usize),
    /// The time and value arrays differ in length.
    #[error("mismatched input: {0} times but {1} values")]
    Mismatch(usize, usize),
}

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    /// Change of y per unit of x.
    pub slope: f64,
    /// y at x = 0.
    pub intercept: f64,
}

impl Regression {
    /// The x at which the line reaches `y`. Meaningless for a zero slope.
    pub fn solve(&self, y: f64) -> f64 {
        (y - self.intercept) / self.slope
    }
}

/// Fit a line through `(x[i], y[i])` minimizing the sum of squared
/// residuals.
///
/// The normal equations are evaluated over x shifted by `x[0]`. That is the
/// same line but keeps the sums small when x is seconds since the epoch; the
/// intercept is translated back before returning.
pub fn fit(x: &[f64], y: &[f64]) -> Result<Regression, Error> {
    if x.len() != y.len() {
        return Err(Error::Mismatch(x.len(), y.len()));
    }
    let n = x.len();
    if n < 2 {
        return Err(Error::InsufficientData(n));
    }
    let origin = x[0];
    let len = n as f64;

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x_squared = 0.0;
    let mut sum_of_products = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let xi = xi - origin;
        sum_x += xi;
        sum_y += yi;
        sum_x_squared += xi * xi;
        sum_of_products += xi * yi;
    }

    let denominator = sum_x_squared - (sum_x * sum_x) / len;
    if denominator == 0.0 {
        return Err(Error::Degenerate(n));
    }
    let slope = (sum_of_products - (sum_x * sum_y) / len) / denominator;
    let shifted_intercept = (sum_y - slope * sum_x) / len;
    Ok(Regression {
        slope: slope,
        intercept: shifted_intercept - slope * origin,
    })
}
