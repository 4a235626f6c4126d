//! hsi-core - Basic data structures for hyperspectral image analysis
//!
//! This crate provides the fundamental data structures shared by the
//! anomaly detector and the I/O layer:
//!
//! - [`Cube`] - Hyperspectral cube, `rows x cols x bands`
//! - [`Grid`] - Floating-point 2D raster (detector scores, single bands)
//! - [`Mask`] - Boolean 2D eligibility grid
//!
//! `Cube` and `Grid` carry a native text-header + binary serialization
//! (see [`cube::serial`] and [`grid::serial`]).

pub mod cube;
pub mod error;
pub mod grid;
pub mod mask;
mod serial;

pub use cube::Cube;
pub use error::{Error, Result};
pub use grid::Grid;
pub use mask::Mask;
