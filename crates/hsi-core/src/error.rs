//! Error types for hsi-core
//!
//! Provides a unified error type for all operations on the core data
//! structures. Each variant captures enough context for diagnostics
//! without exposing internal layout details.

use thiserror::Error;

/// hsi-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid array dimensions
    #[error("invalid dimensions: {rows}x{cols}x{bands}")]
    InvalidDimension { rows: u32, cols: u32, bands: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Spatial dimension mismatch between two arrays
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized data could not be decoded
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Result type alias for hsi-core operations
pub type Result<T> = std::result::Result<T, Error>;
