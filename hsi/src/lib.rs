//! hsi - Hyperspectral anomaly detection for Rust
//!
//! Scores every pixel of a hyperspectral cube with the windowed
//! Reed-Xiaoli (RX) detector: the squared Mahalanobis distance of the pixel
//! spectrum from the mean and covariance of a local background annulus.
//!
//! # Overview
//!
//! - Data model: [`Cube`], [`Mask`], [`Grid`]
//! - Detection: [`anomaly::RxDetector`], [`anomaly::rx_anomaly`]
//! - File I/O (TIFF and native formats): [`io::read_cube`],
//!   [`io::read_mask`], [`io::write_scores`]
//!
//! # Example
//!
//! ```
//! use hsi::Cube;
//! use hsi::anomaly::{RxDetector, RxOptions};
//!
//! let mut cube = Cube::new(7, 7, 2).unwrap();
//! for (i, v) in cube.data_mut().iter_mut().enumerate() {
//!     *v = ((i * 37) % 11) as f64;
//! }
//!
//! let detector = RxDetector::new(RxOptions::new(1, 1)).unwrap();
//! let scores = detector.detect(&cube, None).unwrap();
//! assert_eq!(scores.dimensions(), (7, 7));
//! assert!(scores.data().iter().all(|&s| s >= 0.0));
//! ```

// Re-export core types (primary data structures used everywhere)
pub use hsi_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use hsi_anomaly as anomaly;
pub use hsi_io as io;
