//! Mahalanobis scoring
//!
//! `score = zᵗ Σ⁺ z` with `z = x - mu`.

use crate::stats::BackgroundStats;
use crate::{AnomalyError, AnomalyResult};
use nalgebra::{DMatrix, DVector};

/// Squared Mahalanobis distance of `x` from `mean` under `inverse`.
///
/// The truncated pseudo-inverse of a covariance is positive semi-definite,
/// so the exact value is never negative; rounding below zero is clamped.
///
/// # Errors
///
/// - `InvalidParameter` if the lengths of `x`, `mean` and the sides of
///   `inverse` disagree
/// - `Numerical` if the distance is NaN or infinite
pub fn mahalanobis(x: &[f64], mean: &DVector<f64>, inverse: &DMatrix<f64>) -> AnomalyResult<f64> {
    check_lengths(x, mean, inverse)?;
    let z = DVector::from_iterator(x.len(), x.iter().zip(mean.iter()).map(|(xi, mi)| xi - mi));
    quadratic_form(&z, inverse)
}

fn check_lengths(x: &[f64], mean: &DVector<f64>, inverse: &DMatrix<f64>) -> AnomalyResult<()> {
    let n = x.len();
    if mean.len() != n || inverse.shape() != (n, n) {
        return Err(AnomalyError::InvalidParameter(format!(
            "spectrum of length {n} does not match mean of length {} and a {}x{} inverse",
            mean.len(),
            inverse.nrows(),
            inverse.ncols()
        )));
    }
    Ok(())
}

fn quadratic_form(z: &DVector<f64>, inverse: &DMatrix<f64>) -> AnomalyResult<f64> {
    let d = z.dot(&(inverse * z));
    if !d.is_finite() {
        return Err(AnomalyError::Numerical(format!(
            "mahalanobis distance is not finite ({d})"
        )));
    }
    Ok(if d < 0.0 { 0.0 } else { d })
}

impl BackgroundStats {
    /// Score the spectrum `x` against these background statistics.
    ///
    /// The deviation from the mean is divided by the background spread so
    /// that it meets the normalized pseudo-inverse.
    ///
    /// # Errors
    ///
    /// Returns `AnomalyError::InvalidParameter` if `x` has the wrong length
    /// and `AnomalyError::Numerical` if the score is not finite.
    pub fn score(&self, x: &[f64]) -> AnomalyResult<f64> {
        let inverse = self.inverse().matrix();
        check_lengths(x, self.mean(), inverse)?;
        let spread = self.spread();
        let z = DVector::from_iterator(
            x.len(),
            x.iter()
                .zip(self.mean().iter())
                .map(|(xi, mi)| (xi - mi) / spread),
        );
        quadratic_form(&z, inverse)
    }
}
