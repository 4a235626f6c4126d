//! hsi-anomaly - Windowed Reed-Xiaoli anomaly detection
//!
//! This crate scores every pixel of a hyperspectral cube by its squared
//! Mahalanobis distance from the local background:
//!
//! - Window template (guard square inside a background annulus)
//! - Column-major enumeration of valid window centers
//! - Background mean and unbiased sample covariance
//! - Truncated-SVD pseudo-inverse of the covariance
//! - Mahalanobis scoring, sequential or on the rayon pool
//!
//! Pixels within `guard_win + bg_win` of the image border, and centers
//! excluded by the optional mask, score 0.

pub mod detector;
mod error;
pub mod options;
pub mod pinv;
pub mod positions;
pub mod score;
pub mod stats;
pub mod window;

pub use error::{AnomalyError, AnomalyResult};
pub use options::{DEFAULT_BG_WIN, DEFAULT_GUARD_WIN, Execution, MaskMode, RxOptions};
pub use window::{MAX_WINDOW_WIDTH, WindowTemplate};

// Re-export commonly used functions
pub use detector::{RxDetector, rx_anomaly};
pub use pinv::{PseudoInverse, pseudo_inverse, spacing};
pub use positions::{Position, WindowPositions};
pub use score::mahalanobis;
pub use stats::{BackgroundStats, background_samples};
