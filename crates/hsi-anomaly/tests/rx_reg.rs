//! Windowed RX regression test
//!
//! Checks the structural properties of the score grid: shape, border band,
//! mask handling, non-negativity, determinism, scale invariance and the
//! degenerate-background behaviour.

use hsi_anomaly::{AnomalyError, Execution, MaskMode, RxDetector, RxOptions, rx_anomaly};
use hsi_core::{Grid, Mask};
use hsi_test::{RegParams, random_cube, spike_cube, uniform_cube};

fn border_is_zero(scores: &Grid, half_width: u32) -> bool {
    let (rows, cols) = scores.dimensions();
    (0..rows).all(|r| {
        (0..cols).all(|c| {
            let inside =
                r >= half_width && c >= half_width && r < rows - half_width && c < cols - half_width;
            inside || scores.get_value_unchecked(r, c) == 0.0
        })
    })
}

#[test]
fn rx_shape_and_border_reg() {
    let mut rp = RegParams::new("rx_border");

    let cube = random_cube(14, 11, 3, 17);
    let scores = rx_anomaly(&cube, None, 1, 2).unwrap();
    rp.compare_values(14.0, f64::from(scores.rows()), 0.0);
    rp.compare_values(11.0, f64::from(scores.cols()), 0.0);

    // half width 3: interior is 8 x 5
    let hw = 3;
    rp.compare_values(1.0, border_is_zero(&scores, hw) as u8 as f64, 0.0);
    rp.compare_values(0.0, scores.min().0, 0.0);
    let interior_positive = (hw..14 - hw)
        .all(|r| (hw..11 - hw).all(|c| scores.get_value_unchecked(r, c) > 0.0));
    rp.compare_values(1.0, interior_positive as u8 as f64, 0.0);

    if rp.display() {
        rp.write_grid(&scores).unwrap();
    }
    assert!(rp.cleanup(), "rx_border regression test failed");
}

#[test]
fn rx_scores_non_negative_reg() {
    let mut rp = RegParams::new("rx_nonneg");

    for seed in [1, 2, 3] {
        let cube = random_cube(12, 12, 4, seed);
        let scores = rx_anomaly(&cube, None, 0, 2).unwrap();
        let (min, _, _) = scores.min();
        rp.compare_values(1.0, (min >= 0.0) as u8 as f64, 0.0);
        rp.compare_values(1.0, scores.data().iter().all(|v| v.is_finite()) as u8 as f64, 0.0);
    }

    assert!(rp.cleanup(), "rx_nonneg regression test failed");
}

#[test]
fn rx_uniform_cube_reg() {
    let mut rp = RegParams::new("rx_uniform");

    // constant background: zero covariance, zero pseudo-inverse, zero score
    let cube = uniform_cube(10, 10, 3, 0.1);
    let scores = rx_anomaly(&cube, None, 1, 1).unwrap();
    rp.compare_values(0.0, scores.count_nonzero() as f64, 0.0);
    rp.compare_grids(&Grid::new(10, 10).unwrap(), &scores, 0.0);

    assert!(rp.cleanup(), "rx_uniform regression test failed");
}

#[test]
fn rx_spike_in_guard_reg() {
    let mut rp = RegParams::new("rx_spike_guard");

    // 7x7 with width 5 has nine centers; the spike at (3, 3) lies in the
    // guard square of every one of them, so every background is all zero
    let cube = spike_cube(7, 7, 1, 3, 3, 100.0);
    let detector = RxDetector::new(RxOptions::new(1, 1)).unwrap();
    rp.compare_values(9.0, detector.positions(7, 7).unwrap().len() as f64, 0.0);

    let scores = detector.detect(&cube, None).unwrap();
    rp.compare_values(0.0, scores.get_value(3, 3).unwrap(), 0.0);
    rp.compare_values(0.0, scores.count_nonzero() as f64, 0.0);

    assert!(rp.cleanup(), "rx_spike_guard regression test failed");
}

#[test]
fn rx_spike_in_background_reg() {
    let mut rp = RegParams::new("rx_spike_background");

    // exact fit: one center at (2, 2); the spike is a background sample
    let cube = spike_cube(5, 5, 1, 0, 0, 100.0);
    let scores = rx_anomaly(&cube, None, 1, 1).unwrap();
    let center = scores.get_value(2, 2).unwrap();
    rp.compare_values(1.0, (center.is_finite() && center > 0.0) as u8 as f64, 0.0);
    rp.compare_values(0.0625, center, 1e-12);
    rp.compare_values(1.0, scores.count_nonzero() as f64, 0.0);

    assert!(rp.cleanup(), "rx_spike_background regression test failed");
}

#[test]
fn rx_anomaly_ranking_reg() {
    let mut rp = RegParams::new("rx_ranking");

    let mut cube = random_cube(15, 15, 3, 5);
    cube.set_spectrum(7, 7, &[10.0, 10.0, 10.0]).unwrap();
    let scores = rx_anomaly(&cube, None, 1, 2).unwrap();
    let (max, row, col) = scores.max();
    rp.compare_values(7.0, f64::from(row), 0.0);
    rp.compare_values(7.0, f64::from(col), 0.0);
    rp.compare_values(1.0, (max > 100.0) as u8 as f64, 0.0);

    assert!(rp.cleanup(), "rx_ranking regression test failed");
}

#[test]
fn rx_mask_reg() {
    let mut rp = RegParams::new("rx_mask");

    let cube = random_cube(12, 12, 3, 11);
    let mut mask = Mask::new(12, 12, true).unwrap();
    for (r, c) in [(4, 4), (5, 7), (8, 8)] {
        mask.set(r, c, false).unwrap();
    }

    let full = rx_anomaly(&cube, None, 1, 1).unwrap();
    let masked = rx_anomaly(&cube, Some(&mask), 1, 1).unwrap();

    // masked-out centers are zero, every other cell is unchanged
    for r in 0..12 {
        for c in 0..12 {
            let expected = if mask.get(r, c).unwrap() {
                full.get_value(r, c).unwrap()
            } else {
                0.0
            };
            rp.compare_values(expected, masked.get_value(r, c).unwrap(), 0.0);
        }
    }

    // an all-false mask scores nothing
    let none = Mask::new(12, 12, false).unwrap();
    let scores = rx_anomaly(&cube, Some(&none), 1, 1).unwrap();
    rp.compare_values(0.0, scores.count_nonzero() as f64, 0.0);

    assert!(rp.cleanup(), "rx_mask regression test failed");
}

#[test]
fn rx_background_mask_reg() {
    let mut rp = RegParams::new("rx_background_mask");

    let cube = random_cube(9, 9, 2, 23);
    let mut mask = Mask::new(9, 9, true).unwrap();
    mask.set(0, 0, false).unwrap();

    let detector =
        RxDetector::new(RxOptions::new(1, 1).with_mask_mode(MaskMode::CentersAndBackground))
            .unwrap();
    let with_bg = detector.detect(&cube, Some(&mask)).unwrap();
    let centers_only = rx_anomaly(&cube, Some(&mask), 1, 1).unwrap();

    // (0, 0) is background only for the window centered at (2, 2)
    let stats = detector
        .background_stats(&cube, hsi_anomaly::Position::new(2, 2), Some(&mask))
        .unwrap();
    rp.compare_values(15.0, stats.sample_count() as f64, 0.0);
    rp.compare_values(
        1.0,
        (with_bg.get_value(2, 2).unwrap() != centers_only.get_value(2, 2).unwrap()) as u8 as f64,
        0.0,
    );
    rp.compare_values(
        centers_only.get_value(6, 6).unwrap(),
        with_bg.get_value(6, 6).unwrap(),
        0.0,
    );

    assert!(rp.cleanup(), "rx_background_mask regression test failed");
}

#[test]
fn rx_determinism_reg() {
    let mut rp = RegParams::new("rx_determinism");

    let cube = random_cube(16, 13, 5, 99);
    let a = rx_anomaly(&cube, None, 1, 2).unwrap();
    let b = rx_anomaly(&cube, None, 1, 2).unwrap();
    rp.compare_grids(&a, &b, 0.0);

    let parallel = RxDetector::new(RxOptions::new(1, 2).with_execution(Execution::Parallel))
        .unwrap()
        .detect(&cube, None)
        .unwrap();
    rp.compare_grids(&a, &parallel, 0.0);

    assert!(rp.cleanup(), "rx_determinism regression test failed");
}

#[cfg(feature = "parallel")]
#[test]
fn rx_parallel_pool_reg() {
    let mut rp = RegParams::new("rx_parallel_pool");

    let cube = random_cube(21, 17, 4, 57);
    let mut mask = Mask::new(21, 17, true).unwrap();
    for r in 0..21 {
        mask.set(r, 8, false).unwrap();
    }
    let sequential = RxDetector::new(RxOptions::new(1, 2))
        .unwrap()
        .detect(&cube, Some(&mask))
        .unwrap();

    let detector =
        RxDetector::new(RxOptions::new(1, 2).with_execution(Execution::Parallel)).unwrap();
    for threads in [1, 4] {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        let parallel = pool.install(|| detector.detect(&cube, Some(&mask))).unwrap();
        rp.compare_grids(&sequential, &parallel, 0.0);
    }

    assert!(rp.cleanup(), "rx_parallel_pool regression test failed");
}

#[test]
fn rx_scale_invariance_reg() {
    let mut rp = RegParams::new("rx_scale");

    // 40 background samples, 3 bands: full-rank covariances
    let cube = random_cube(13, 13, 3, 31);
    let base = rx_anomaly(&cube, None, 1, 2).unwrap();

    for factor in [2.0, 4.0, 0.5] {
        let scaled = rx_anomaly(&cube.scaled(factor), None, 1, 2).unwrap();
        for (&x, &y) in base.data().iter().zip(scaled.data()) {
            let tol = 1e-6 * x.abs().max(1.0);
            rp.compare_values(x, y, tol);
        }
    }

    assert!(rp.cleanup(), "rx_scale regression test failed");
}

#[test]
fn rx_extreme_magnitude_reg() {
    let mut rp = RegParams::new("rx_extreme_magnitude");

    // covariances of these cubes underflow to subnormals or overflow
    let cube = random_cube(13, 13, 3, 31);
    let base = rx_anomaly(&cube, None, 1, 2).unwrap();
    let detector = RxDetector::new(RxOptions::new(1, 2)).unwrap();

    for factor in [1e-160, 1e-150, 1e160] {
        let scores = detector.detect(&cube.scaled(factor), None).unwrap();
        for pos in detector.positions(13, 13).unwrap() {
            let v = scores.get_value(pos.row, pos.col).unwrap();
            rp.compare_values(1.0, (v.is_finite() && v > 0.0) as u8 as f64, 0.0);
        }
        for (&x, &y) in base.data().iter().zip(scores.data()) {
            let tol = 1e-6 * x.abs().max(1.0);
            rp.compare_values(x, y, tol);
        }
    }

    assert!(rp.cleanup(), "rx_extreme_magnitude regression test failed");
}

#[test]
fn rx_more_bands_than_samples_reg() {
    let mut rp = RegParams::new("rx_rank_deficient");

    // 16 background samples, 20 bands: singular covariance everywhere
    let cube = random_cube(7, 7, 20, 3);
    let detector = RxDetector::new(RxOptions::new(1, 1)).unwrap();
    let scores = detector.detect(&cube, None).unwrap();
    for pos in detector.positions(7, 7).unwrap() {
        let v = scores.get_value(pos.row, pos.col).unwrap();
        rp.compare_values(1.0, (v.is_finite() && v >= 0.0) as u8 as f64, 0.0);
        let stats = detector.background_stats(&cube, pos, None).unwrap();
        rp.compare_values(1.0, (stats.inverse().rank() <= 15) as u8 as f64, 0.0);
    }

    assert!(rp.cleanup(), "rx_rank_deficient regression test failed");
}

#[test]
fn rx_errors_reg() {
    let cube = random_cube(8, 8, 2, 1);

    assert!(matches!(
        rx_anomaly(&cube, None, 2, 0),
        Err(AnomalyError::InvalidParameter(_))
    ));
    assert!(matches!(
        rx_anomaly(&cube, None, 2, 2),
        Err(AnomalyError::InvalidParameter(_))
    ));

    let wrong = Mask::new(8, 9, true).unwrap();
    assert!(matches!(
        rx_anomaly(&cube, Some(&wrong), 1, 1),
        Err(AnomalyError::ShapeMismatch { .. })
    ));

    // background mask removes every sample of the window at (2, 2)
    let mut mask = Mask::new(8, 8, true).unwrap();
    for r in 0..5 {
        for c in 0..5 {
            if r == 0 || c == 0 || r == 4 || c == 4 {
                mask.set(r, c, false).unwrap();
            }
        }
    }
    let detector =
        RxDetector::new(RxOptions::new(1, 1).with_mask_mode(MaskMode::CentersAndBackground))
            .unwrap();
    assert!(matches!(
        detector.detect(&cube, Some(&mask)),
        Err(AnomalyError::DegenerateBackground { row: 2, col: 2 })
    ));
    // the same mask only gates centers by default
    assert!(rx_anomaly(&cube, Some(&mask), 1, 1).is_ok());
}
