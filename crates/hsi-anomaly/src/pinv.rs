//! Truncated-SVD pseudo-inverse
//!
//! For `A = U S Vᵗ`, singular values at or below
//! `tol = max(nrows, ncols) * spacing(max(S))` are treated as zero and
//! dropped; the pseudo-inverse is rebuilt from the retained ones as
//! `A⁺ = V_r diag(1/s_r) U_rᵗ`.
//!
//! A singular covariance (fewer background samples than bands) is the
//! common case and is handled here; a plain matrix inverse is never used.

use crate::{AnomalyError, AnomalyResult};
use nalgebra::{DMatrix, SVD};

/// Distance from `|x|` to the next larger representable `f64`.
///
/// `spacing(0.0)` is the smallest positive subnormal. Returns NaN for
/// non-finite input.
pub fn spacing(x: f64) -> f64 {
    let a = x.abs();
    if !a.is_finite() {
        return f64::NAN;
    }
    f64::from_bits(a.to_bits() + 1) - a
}

/// Rank-determination tolerance for a `nrows x ncols` matrix whose largest
/// singular value is `max_singular`.
pub fn rank_tolerance(nrows: usize, ncols: usize, max_singular: f64) -> f64 {
    nrows.max(ncols) as f64 * spacing(max_singular)
}

/// A pseudo-inverse together with the rank decision that produced it.
#[derive(Debug, Clone)]
pub struct PseudoInverse {
    matrix: DMatrix<f64>,
    rank: usize,
    tolerance: f64,
}

impl PseudoInverse {
    /// The `ncols x nrows` pseudo-inverse matrix
    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Number of singular values retained
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Threshold below which singular values were dropped
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Consume and return the matrix
    pub fn into_matrix(self) -> DMatrix<f64> {
        self.matrix
    }
}

/// Compute the truncated-SVD pseudo-inverse of `a`.
///
/// # Errors
///
/// Returns `AnomalyError::Numerical` if `a` contains non-finite values
/// (the decomposition would not converge), or if a kept singular value is
/// so small that its reciprocal overflows.
pub fn pseudo_inverse(a: &DMatrix<f64>) -> AnomalyResult<PseudoInverse> {
    let (nrows, ncols) = a.shape();
    if a.iter().any(|v| !v.is_finite()) {
        return Err(AnomalyError::Numerical(format!(
            "cannot decompose a {nrows}x{ncols} matrix with non-finite entries"
        )));
    }

    let svd = SVD::try_new(a.clone(), true, true, f64::EPSILON, 0)
        .ok_or_else(|| AnomalyError::Numerical("SVD did not converge".into()))?;
    let u = svd
        .u
        .as_ref()
        .ok_or_else(|| AnomalyError::Numerical("SVD returned no left factor".into()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| AnomalyError::Numerical("SVD returned no right factor".into()))?;

    let max_singular = svd.singular_values.iter().copied().fold(0.0, f64::max);
    let tolerance = rank_tolerance(nrows, ncols, max_singular);

    let mut matrix = DMatrix::zeros(ncols, nrows);
    let mut rank = 0;
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s > tolerance {
            let v_k = v_t.row(k).transpose();
            let u_k = u.column(k);
            matrix += (v_k * u_k.transpose()) / s;
            rank += 1;
        }
    }

    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(AnomalyError::Numerical(format!(
            "pseudo-inverse of a {nrows}x{ncols} matrix overflows (smallest kept singular value below 1/f64::MAX)"
        )));
    }

    if rank == 0 && max_singular > 0.0 {
        log::warn!(
            "pseudo_inverse: every singular value of a {nrows}x{ncols} matrix is below tol={tolerance:e}"
        );
    }

    Ok(PseudoInverse {
        matrix,
        rank,
        tolerance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() <= tol, "{a} != {b}");
        }
    }

    #[test]
    fn test_spacing() {
        assert_eq!(spacing(1.0), f64::EPSILON);
        assert_eq!(spacing(-2.0), 2.0 * f64::EPSILON);
        assert_eq!(spacing(0.0), f64::from_bits(1));
        assert!(spacing(f64::NAN).is_nan());
        assert!(spacing(f64::INFINITY).is_nan());
    }

    #[test]
    fn test_rank_tolerance_uses_larger_dimension() {
        assert_eq!(rank_tolerance(3, 5, 1.0), 5.0 * f64::EPSILON);
        assert_eq!(rank_tolerance(4, 4, 0.0), 4.0 * f64::from_bits(1));
    }

    #[test]
    fn test_full_rank_matches_inverse() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let pinv = pseudo_inverse(&a).unwrap();
        let inv = a.clone().try_inverse().unwrap();
        assert_eq!(pinv.rank(), 2);
        assert_close(pinv.matrix(), &inv, 1e-12);
    }

    #[test]
    fn test_rank_deficient() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let pinv = pseudo_inverse(&a).unwrap();
        assert_eq!(pinv.rank(), 1);
        let expected = DMatrix::from_element(2, 2, 0.25);
        assert_close(pinv.matrix(), &expected, 1e-12);
    }

    #[test]
    fn test_zero_matrix() {
        let a = DMatrix::<f64>::zeros(3, 3);
        let pinv = pseudo_inverse(&a).unwrap();
        assert_eq!(pinv.rank(), 0);
        assert!(pinv.matrix().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_moore_penrose_identities() {
        // rank-2 symmetric PSD matrix: B Bᵗ with B 3x2
        let b = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 0.5, -1.0, 3.0, 0.25]);
        let a = &b * b.transpose();
        let pinv = pseudo_inverse(&a).unwrap();
        assert_eq!(pinv.rank(), 2);
        let p = pinv.matrix();
        assert_close(&(&a * p * &a), &a, 1e-9);
        assert_close(&(p * &a * p), p, 1e-9);
        let ap = &a * p;
        assert_close(&ap, &ap.transpose(), 1e-9);
    }

    #[test]
    fn test_rectangular_shape() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        let pinv = pseudo_inverse(&a).unwrap();
        assert_eq!(pinv.matrix().shape(), (3, 2));
        let expected = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 0.5, 0.0, 0.0]);
        assert_close(pinv.matrix(), &expected, 1e-12);
    }

    #[test]
    fn test_non_finite_rejected() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 1.0]);
        assert!(matches!(
            pseudo_inverse(&a),
            Err(AnomalyError::Numerical(_))
        ));
    }

    #[test]
    fn test_subnormal_matrix_overflow_rejected() {
        let a = DMatrix::from_element(1, 1, 1e-320);
        assert!(matches!(
            pseudo_inverse(&a),
            Err(AnomalyError::Numerical(_))
        ));
    }
}
