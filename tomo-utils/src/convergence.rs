//! Convergence statistics of estimated loss series.
//!
//! A series is said to have converged at tick `t` if every value from `t` onwards lies within a
//! relative tolerance of the true value. For a true value of zero, the tolerance is applied as an
//! absolute bound instead.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Default relative tolerance (1%) used to decide convergence.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Check whether `x` lies within the (relative) tolerance of `truth`. `NaN` is never within.
pub fn within(x: f64, truth: f64, tolerance: f64) -> bool {
    if x.is_nan() {
        return false;
    }
    let bound = if truth == 0.0 {
        tolerance
    } else {
        tolerance * truth.abs()
    };
    (x - truth).abs() <= bound
}

/// Returns the first tick after which the series stays within the tolerance of `truth`, or `None`
/// if the last value is still outside.
pub fn convergence_tick(series: &[f64], truth: f64, tolerance: f64) -> Option<usize> {
    match series.iter().rposition(|x| !within(*x, truth, tolerance)) {
        Some(last_outside) if last_outside + 1 == series.len() => None,
        Some(last_outside) => Some(last_outside + 1),
        None if series.is_empty() => None,
        None => Some(0),
    }
}

/// Half width of the normal-approximation (Wald) confidence interval of a Bernoulli proportion `p`
/// estimated from `n` samples.
pub fn wald_half_width(p: f64, n: usize, confidence: f64) -> f64 {
    if n == 0 {
        return f64::INFINITY;
    }
    let quantile = 1.0 - (1.0 - confidence) / 2.0;
    let z = match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(quantile),
        Err(e) => {
            log::error!("Cannot build the standard normal distribution: {e}");
            return f64::INFINITY;
        }
    };
    z * (p * (1.0 - p) / n as f64).sqrt()
}

/// Convergence summary of a single estimated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// The true value the series should approach.
    pub truth: f64,
    /// The last value of the series, `None` if the series is empty or not yet estimable.
    pub final_value: Option<f64>,
    /// Absolute error of the last value.
    pub abs_error: Option<f64>,
    /// First tick from which on the series stays within the tolerance.
    pub converged_at: Option<usize>,
}

impl ConvergenceReport {
    pub fn new(series: &[f64], truth: f64, tolerance: f64) -> Self {
        let final_value = series.last().copied().filter(|x| !x.is_nan());
        Self {
            truth,
            final_value,
            abs_error: final_value.map(|x| (x - truth).abs()),
            converged_at: convergence_tick(series, truth, tolerance),
        }
    }

    pub fn converged(&self) -> bool {
        self.converged_at.is_some()
    }
}
