//! Grid - Two-dimensional floating-point raster
//!
//! `Grid` is a 2D array of `f64` values indexed by `(row, col)`. It is the
//! output type of the anomaly detector (one score per pixel) and the
//! per-band slice type of a [`Cube`](crate::Cube).
//!
//! See [`serial`] for serialization support.
//!
//! # Examples
//!
//! ```
//! use hsi_core::Grid;
//!
//! let mut grid = Grid::new(20, 30).unwrap();
//! grid.set_value(5, 7, 2.5).unwrap();
//! assert_eq!(grid.get_value(5, 7).unwrap(), 2.5);
//!
//! let (max_val, max_row, max_col) = grid.max();
//! assert_eq!((max_val, max_row, max_col), (2.5, 5, 7));
//! ```

pub mod serial;

use crate::error::{Error, Result};

/// Floating-point 2D raster
///
/// # Memory Layout
///
/// Data is stored in row-major order with no padding. The value at
/// `(row, col)` is at index `row * cols + col`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Number of rows
    rows: u32,
    /// Number of columns
    cols: u32,
    /// Values (row-major, no padding)
    data: Vec<f64>,
}

impl Grid {
    /// Create a new grid with all values set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if `rows` or `cols` is 0.
    pub fn new(rows: u32, cols: u32) -> Result<Self> {
        Self::new_with_value(rows, cols, 0.0)
    }

    /// Create a new grid with all values set to `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if `rows` or `cols` is 0.
    pub fn new_with_value(rows: u32, cols: u32, value: f64) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimension {
                rows,
                cols,
                bands: 1,
            });
        }

        let size = (rows as usize) * (cols as usize);
        Ok(Grid {
            rows,
            cols,
            data: vec![value; size],
        })
    }

    /// Create a grid from raw row-major data
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or the data length doesn't
    /// match `rows * cols`.
    pub fn from_data(rows: u32, cols: u32, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimension {
                rows,
                cols,
                bands: 1,
            });
        }

        let expected_size = (rows as usize) * (cols as usize);
        if data.len() != expected_size {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{} = {}",
                data.len(),
                rows,
                cols,
                expected_size
            )));
        }

        Ok(Grid { rows, cols, data })
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Dimensions as `(rows, cols)`
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    #[inline]
    fn index(&self, row: u32, col: u32) -> usize {
        (row as usize) * (self.cols as usize) + (col as usize)
    }

    /// Get the value at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get_value(&self, row: u32, col: u32) -> Result<f64> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: self.index(row, col),
                len: self.data.len(),
            });
        }
        Ok(self.data[self.index(row, col)])
    }

    /// Set the value at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn set_value(&mut self, row: u32, col: u32, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: self.index(row, col),
                len: self.data.len(),
            });
        }
        let idx = self.index(row, col);
        self.data[idx] = value;
        Ok(())
    }

    /// Get the value at `(row, col)` without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if the flat index falls outside the data.
    #[inline]
    pub fn get_value_unchecked(&self, row: u32, col: u32) -> f64 {
        self.data[self.index(row, col)]
    }

    /// Set the value at `(row, col)` without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if the flat index falls outside the data.
    #[inline]
    pub fn set_value_unchecked(&mut self, row: u32, col: u32, value: f64) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    /// Raw access to the values
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the values
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Get one row of values
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows`.
    #[inline]
    pub fn row(&self, row: u32) -> &[f64] {
        let start = (row as usize) * (self.cols as usize);
        &self.data[start..start + self.cols as usize]
    }

    /// Set all values to `value`
    pub fn set_all(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Minimum value and its location as `(value, row, col)`
    ///
    /// NaN values are ignored unless every value is NaN.
    pub fn min(&self) -> (f64, u32, u32) {
        self.extreme(|candidate, best| candidate < best)
    }

    /// Maximum value and its location as `(value, row, col)`
    ///
    /// NaN values are ignored unless every value is NaN.
    pub fn max(&self) -> (f64, u32, u32) {
        self.extreme(|candidate, best| candidate > best)
    }

    fn extreme(&self, better: impl Fn(f64, f64) -> bool) -> (f64, u32, u32) {
        let mut best_idx = 0;
        let mut best = self.data[0];
        for (idx, &val) in self.data.iter().enumerate().skip(1) {
            if best.is_nan() || better(val, best) {
                best = val;
                best_idx = idx;
            }
        }
        let cols = self.cols as usize;
        (best, (best_idx / cols) as u32, (best_idx % cols) as u32)
    }

    /// Count the values that are not exactly zero
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }
}
