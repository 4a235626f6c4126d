//! Error types for hsi-anomaly
//!
//! Parameter and shape problems are reported before any scoring begins.
//! A rank-deficient covariance is not an error; it is handled by the
//! truncated pseudo-inverse.

use thiserror::Error;

/// Errors that can occur during anomaly detection
#[derive(Debug, Error)]
pub enum AnomalyError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] hsi_core::Error),

    /// Invalid window radii, or a window wider than the image
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Mask dimensions disagree with the cube's spatial dimensions
    #[error("shape mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    ShapeMismatch {
        /// Cube spatial dimensions `(rows, cols)`
        expected: (u32, u32),
        /// Mask dimensions `(rows, cols)`
        actual: (u32, u32),
    },

    /// A window position produced no background samples
    #[error("empty background for window centered at ({row}, {col})")]
    DegenerateBackground {
        /// Center row
        row: u32,
        /// Center column
        col: u32,
    },

    /// Non-finite values inside a window
    #[error("non-finite spectrum values in window centered at ({row}, {col})")]
    NonFinite {
        /// Center row
        row: u32,
        /// Center column
        col: u32,
    },

    /// The singular value decomposition did not produce its factors
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Result type for anomaly detection operations
pub type AnomalyResult<T> = Result<T, AnomalyError>;
