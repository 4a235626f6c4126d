//! Background statistics of one window position
//!
//! Gathers the spectra under the background cells of the window template
//! and computes their mean vector, unbiased sample covariance (bands are
//! the variables, background pixels the observations) and the truncated
//! pseudo-inverse of that covariance.
//!
//! Sums are taken relative to the first background spectrum. This is
//! exact algebra for mean and covariance, and it keeps a background whose
//! bands are constant at an exactly zero covariance.
//!
//! The centered samples are divided by their largest absolute deviation
//! (the spread) before the covariance is formed, and the pseudo-inverse is
//! taken of that normalized covariance. Scores are computed in the same
//! normalized frame, so they do not depend on the magnitude of the data
//! and neither underflow nor overflow for very small or very large cubes.

use crate::pinv::{PseudoInverse, pseudo_inverse};
use crate::positions::Position;
use crate::window::WindowTemplate;
use crate::{AnomalyError, AnomalyResult};
use hsi_core::{Cube, Mask};
use nalgebra::{DMatrix, DVector};

/// Mean, covariance and covariance pseudo-inverse of one background set.
#[derive(Debug, Clone)]
pub struct BackgroundStats {
    position: Position,
    sample_count: usize,
    mean: DVector<f64>,
    /// Largest absolute deviation of a sample from the mean
    spread: f64,
    /// Covariance of the samples divided by `spread²`
    normalized: DMatrix<f64>,
    inverse: PseudoInverse,
}

impl BackgroundStats {
    /// Estimate the statistics of the window centered at `pos`.
    ///
    /// When `mask` is given, background cells whose mask value is `false`
    /// are left out of the sample set.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if the window centered at `pos` does not lie
    ///   entirely inside the cube
    /// - `ShapeMismatch` if `mask` disagrees with the cube's shape
    /// - `DegenerateBackground` if no background sample remains
    /// - `NonFinite` if a background spectrum contains NaN or infinity
    pub fn estimate(
        cube: &Cube,
        template: &WindowTemplate,
        pos: Position,
        mask: Option<&Mask>,
    ) -> AnomalyResult<Self> {
        let samples = background_samples(cube, template, pos, mask)?;
        Self::from_samples(&samples, pos)
    }

    /// Statistics of an explicit `N x bands` sample matrix (one spectrum
    /// per row) attributed to `pos`.
    ///
    /// # Errors
    ///
    /// - `DegenerateBackground` if `samples` has no rows
    /// - `NonFinite` if any sample value is NaN or infinite
    pub fn from_samples(samples: &DMatrix<f64>, pos: Position) -> AnomalyResult<Self> {
        let (n, bands) = samples.shape();
        if n == 0 {
            return Err(AnomalyError::DegenerateBackground {
                row: pos.row,
                col: pos.col,
            });
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::NonFinite {
                row: pos.row,
                col: pos.col,
            });
        }

        let reference = samples.row(0).transpose();

        let mut shift = DVector::zeros(bands);
        for i in 0..n {
            for b in 0..bands {
                shift[b] += samples[(i, b)] - reference[b];
            }
        }
        shift /= n as f64;

        let mut centered = DMatrix::zeros(n, bands);
        for i in 0..n {
            for b in 0..bands {
                centered[(i, b)] = (samples[(i, b)] - reference[b]) - shift[b];
            }
        }

        let spread = centered.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
        if !spread.is_finite() {
            return Err(AnomalyError::Numerical(format!(
                "background spread overflows at ({}, {})",
                pos.row, pos.col
            )));
        }
        // a constant background stays exactly zero
        let spread = if spread > 0.0 { spread } else { 1.0 };
        centered /= spread;

        // unbiased estimator; a single sample has no spread
        let divisor = n.saturating_sub(1).max(1) as f64;
        let mut normalized = DMatrix::zeros(bands, bands);
        for j in 0..bands {
            for k in j..bands {
                let mut acc = 0.0;
                for i in 0..n {
                    acc += centered[(i, j)] * centered[(i, k)];
                }
                let value = acc / divisor;
                normalized[(j, k)] = value;
                normalized[(k, j)] = value;
            }
        }

        let inverse = pseudo_inverse(&normalized)?;

        Ok(BackgroundStats {
            position: pos,
            sample_count: n,
            mean: reference + shift,
            spread,
            normalized,
            inverse,
        })
    }

    /// Center of the window these statistics belong to
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Number of background spectra used
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Background mean, one value per band
    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Largest absolute deviation of a background sample from the mean,
    /// or 1 for a constant background
    #[inline]
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Sample covariance, `bands x bands`.
    ///
    /// Rebuilt from the normalized covariance; entries may underflow to 0
    /// or overflow to infinity for extreme data magnitudes.
    pub fn covariance(&self) -> DMatrix<f64> {
        &self.normalized * (self.spread * self.spread)
    }

    /// Covariance divided by `spread²`
    #[inline]
    pub fn normalized_covariance(&self) -> &DMatrix<f64> {
        &self.normalized
    }

    /// Truncated-SVD pseudo-inverse of the normalized covariance
    #[inline]
    pub fn inverse(&self) -> &PseudoInverse {
        &self.inverse
    }
}

/// Collect the background spectra of the window centered at `pos` as an
/// `N x bands` matrix, one spectrum per row, in the template's
/// column-major cell order.
///
/// # Errors
///
/// Returns `InvalidParameter` if the window does not fit inside the cube
/// and `ShapeMismatch` if `mask` disagrees with the cube's shape.
pub fn background_samples(
    cube: &Cube,
    template: &WindowTemplate,
    pos: Position,
    mask: Option<&Mask>,
) -> AnomalyResult<DMatrix<f64>> {
    let (rows, cols) = cube.spatial_dimensions();
    if let Some(mask) = mask {
        if mask.dimensions() != (rows, cols) {
            return Err(AnomalyError::ShapeMismatch {
                expected: (rows, cols),
                actual: mask.dimensions(),
            });
        }
    }

    let hw = template.half_width();
    let fits = pos.row >= hw
        && pos.col >= hw
        && (pos.row - hw) + template.width() <= rows
        && (pos.col - hw) + template.width() <= cols;
    if !fits {
        return Err(AnomalyError::InvalidParameter(format!(
            "window of width {} centered at ({}, {}) exceeds a {rows}x{cols} image",
            template.width(),
            pos.row,
            pos.col
        )));
    }

    let top = pos.row - hw;
    let left = pos.col - hw;
    let cells: Vec<(u32, u32)> = template
        .background_offsets()
        .iter()
        .map(|&(dr, dc)| (top + dr, left + dc))
        .filter(|&(r, c)| mask.is_none_or(|m| m.get_unchecked(r, c)))
        .collect();

    let bands = cube.bands() as usize;
    let mut samples = DMatrix::zeros(cells.len(), bands);
    for (i, &(r, c)) in cells.iter().enumerate() {
        for (b, &v) in cube.spectrum_unchecked(r, c).iter().enumerate() {
            samples[(i, b)] = v;
        }
    }
    Ok(samples)
}
