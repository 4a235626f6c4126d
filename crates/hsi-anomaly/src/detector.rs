//! Windowed RX detector
//!
//! Builds the window template once, then for every valid center position
//! estimates the background statistics and writes the Mahalanobis score of
//! the center spectrum into the output grid. Cells that are never scored
//! (the border band of width `half_width`, and centers excluded by the
//! mask) keep the value 0.
//!
//! Each position reads only immutable inputs and writes one distinct cell,
//! so with the `parallel` feature the positions are scored on the rayon
//! pool. The grid is bit-identical to a sequential run.
//!
//! # Example
//!
//! ```
//! use hsi_anomaly::{RxDetector, RxOptions};
//! use hsi_core::Cube;
//!
//! let mut cube = Cube::new(9, 9, 3).unwrap();
//! for (i, v) in cube.data_mut().iter_mut().enumerate() {
//!     *v = ((i * 7919) % 13) as f64;
//! }
//!
//! let detector = RxDetector::new(RxOptions::new(1, 1)).unwrap();
//! let scores = detector.detect(&cube, None).unwrap();
//! assert_eq!(scores.dimensions(), (9, 9));
//! // the border band is never scored
//! assert_eq!(scores.get_value(0, 4).unwrap(), 0.0);
//! ```

use crate::options::{Execution, MaskMode, RxOptions};
use crate::positions::{Position, WindowPositions};
use crate::stats::BackgroundStats;
use crate::window::WindowTemplate;
use crate::{AnomalyError, AnomalyResult};
use hsi_core::{Cube, Grid, Mask};

/// Windowed Reed-Xiaoli anomaly detector
#[derive(Debug, Clone)]
pub struct RxDetector {
    options: RxOptions,
    template: WindowTemplate,
}

impl RxDetector {
    /// Create a detector, building its window template.
    ///
    /// # Errors
    ///
    /// Returns `AnomalyError::InvalidParameter` for invalid radii.
    pub fn new(options: RxOptions) -> AnomalyResult<Self> {
        options.validate()?;
        let template = WindowTemplate::new(options.guard_win, options.bg_win)?;
        Ok(Self { options, template })
    }

    /// Detector options
    #[inline]
    pub fn options(&self) -> &RxOptions {
        &self.options
    }

    /// Window template shared by every position
    #[inline]
    pub fn template(&self) -> &WindowTemplate {
        &self.template
    }

    /// Valid center positions for an image of `rows x cols`.
    ///
    /// # Errors
    ///
    /// Returns `AnomalyError::InvalidParameter` if the window does not fit.
    pub fn positions(&self, rows: u32, cols: u32) -> AnomalyResult<WindowPositions> {
        WindowPositions::new(rows, cols, &self.template)
    }

    /// Background statistics of the window centered at `pos`.
    ///
    /// `mask` only affects the samples in [`MaskMode::CentersAndBackground`].
    pub fn background_stats(
        &self,
        cube: &Cube,
        pos: Position,
        mask: Option<&Mask>,
    ) -> AnomalyResult<BackgroundStats> {
        let bg_mask = match self.options.mask_mode {
            MaskMode::Centers => None,
            MaskMode::CentersAndBackground => mask,
        };
        BackgroundStats::estimate(cube, &self.template, pos, bg_mask)
    }

    /// Score the center pixel of the window centered at `pos`.
    ///
    /// The center's own mask value is not consulted.
    pub fn score_at(&self, cube: &Cube, pos: Position, mask: Option<&Mask>) -> AnomalyResult<f64> {
        let stats = self.background_stats(cube, pos, mask)?;
        let center = cube.spectrum(pos.row, pos.col)?;
        if center.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::NonFinite {
                row: pos.row,
                col: pos.col,
            });
        }
        let score = stats.score(center)?;
        log::trace!(
            "rx score at ({}, {}): {score:e} (samples={}, rank={})",
            pos.row,
            pos.col,
            stats.sample_count(),
            stats.inverse().rank()
        );
        Ok(score)
    }

    /// Run the detector over `cube`.
    ///
    /// Returns a `rows x cols` grid of scores. `mask`, when given, must have
    /// the cube's spatial shape; centers where it is `false` are skipped.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if `mask` disagrees with the cube
    /// - `InvalidParameter` if the window is wider than the image
    /// - `DegenerateBackground` if a window has no background sample
    ///   (only possible with [`MaskMode::CentersAndBackground`])
    /// - `NonFinite` if a window contains NaN or infinite values
    /// - `Numerical` if a score or pseudo-inverse is not finite
    pub fn detect(&self, cube: &Cube, mask: Option<&Mask>) -> AnomalyResult<Grid> {
        let (rows, cols, bands) = cube.dimensions();
        if let Some(mask) = mask {
            if mask.dimensions() != (rows, cols) {
                return Err(AnomalyError::ShapeMismatch {
                    expected: (rows, cols),
                    actual: mask.dimensions(),
                });
            }
        }
        let positions = self.positions(rows, cols)?;
        let total = positions.len();

        let eligible: Vec<Position> = positions
            .filter(|p| mask.is_none_or(|m| m.get_unchecked(p.row, p.col)))
            .collect();

        log::debug!(
            "rx detect: cube {rows}x{cols}x{bands}, guard_win={}, bg_win={}, width={}, \
             {} background cells, {} of {total} positions eligible, {:?}",
            self.template.guard_win(),
            self.template.bg_win(),
            self.template.width(),
            self.template.background_count(),
            eligible.len(),
            self.options.execution
        );

        let scores = match self.options.execution {
            Execution::Sequential => self.score_sequential(cube, mask, &eligible)?,
            Execution::Parallel => self.score_parallel(cube, mask, &eligible)?,
        };

        let mut grid = Grid::new(rows, cols)?;
        for (pos, score) in eligible.iter().zip(scores) {
            grid.set_value_unchecked(pos.row, pos.col, score);
        }

        log::debug!(
            "rx detect: scored {} positions, skipped {} by mask",
            eligible.len(),
            total - eligible.len()
        );
        Ok(grid)
    }

    fn score_sequential(
        &self,
        cube: &Cube,
        mask: Option<&Mask>,
        positions: &[Position],
    ) -> AnomalyResult<Vec<f64>> {
        positions
            .iter()
            .map(|&pos| self.score_at(cube, pos, mask))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn score_parallel(
        &self,
        cube: &Cube,
        mask: Option<&Mask>,
        positions: &[Position],
    ) -> AnomalyResult<Vec<f64>> {
        use rayon::prelude::*;

        positions
            .par_iter()
            .map(|&pos| self.score_at(cube, pos, mask))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn score_parallel(
        &self,
        cube: &Cube,
        mask: Option<&Mask>,
        positions: &[Position],
    ) -> AnomalyResult<Vec<f64>> {
        log::warn!("rx detect: built without the `parallel` feature, scoring sequentially");
        self.score_sequential(cube, mask, positions)
    }
}

/// Run the windowed RX detector with default policies.
///
/// Convenience wrapper for [`RxDetector::detect`] with
/// [`RxOptions::new(guard_win, bg_win)`](RxOptions::new).
pub fn rx_anomaly(cube: &Cube, mask: Option<&Mask>, guard_win: u32, bg_win: u32) -> AnomalyResult<Grid> {
    RxDetector::new(RxOptions::new(guard_win, bg_win))?.detect(cube, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike_cube() -> Cube {
        // 5x5 single band, the corner (0, 0) lies in the background of the
        // only window
        let mut cube = Cube::new(5, 5, 1).unwrap();
        cube.set_value(0, 0, 0, 100.0).unwrap();
        cube
    }

    #[test]
    fn test_single_window_positive_score() {
        let scores = rx_anomaly(&spike_cube(), None, 1, 1).unwrap();
        let center = scores.get_value(2, 2).unwrap();
        assert!(center.is_finite() && center > 0.0);
        assert_eq!(scores.count_nonzero(), 1);
    }

    #[test]
    fn test_single_window_value() {
        // background: fifteen 0s and one 100 -> mean 6.25,
        // variance (93.75^2 + 15 * 6.25^2) / 15 = 625, center z = -6.25
        let scores = rx_anomaly(&spike_cube(), None, 1, 1).unwrap();
        let expected = 6.25 * 6.25 / 625.0;
        assert!((scores.get_value(2, 2).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_score_at_matches_detect() {
        let mut cube = Cube::new(8, 7, 2).unwrap();
        for (i, v) in cube.data_mut().iter_mut().enumerate() {
            *v = ((i * 31) % 17) as f64;
        }
        let detector = RxDetector::new(RxOptions::new(1, 1)).unwrap();
        let grid = detector.detect(&cube, None).unwrap();
        for pos in detector.positions(8, 7).unwrap() {
            let score = detector.score_at(&cube, pos, None).unwrap();
            assert_eq!(grid.get_value(pos.row, pos.col).unwrap(), score);
        }
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let cube = Cube::new(6, 6, 2).unwrap();
        let mask = Mask::new(6, 7, true).unwrap();
        assert!(matches!(
            rx_anomaly(&cube, Some(&mask), 1, 1),
            Err(AnomalyError::ShapeMismatch {
                expected: (6, 6),
                actual: (6, 7)
            })
        ));
    }

    #[test]
    fn test_window_wider_than_image() {
        let cube = Cube::new(4, 10, 2).unwrap();
        assert!(matches!(
            rx_anomaly(&cube, None, 1, 1),
            Err(AnomalyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_bg_win() {
        let cube = Cube::new(10, 10, 2).unwrap();
        assert!(matches!(
            rx_anomaly(&cube, None, 1, 0),
            Err(AnomalyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_background_mask_can_empty_window() {
        let cube = Cube::new(5, 5, 1).unwrap();
        let mut mask = Mask::new(5, 5, false).unwrap();
        mask.set(2, 2, true).unwrap();
        let detector =
            RxDetector::new(RxOptions::new(1, 1).with_mask_mode(MaskMode::CentersAndBackground))
                .unwrap();
        assert!(matches!(
            detector.detect(&cube, Some(&mask)),
            Err(AnomalyError::DegenerateBackground { row: 2, col: 2 })
        ));
    }

    #[test]
    fn test_non_finite_center() {
        let mut cube = Cube::new(5, 5, 1).unwrap();
        cube.set_value(2, 2, 0, f64::NAN).unwrap();
        assert!(matches!(
            rx_anomaly(&cube, None, 1, 1),
            Err(AnomalyError::NonFinite { row: 2, col: 2 })
        ));
    }
}
