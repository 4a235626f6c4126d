//! Mask - Two-dimensional boolean eligibility grid
//!
//! A pixel whose mask value is `true` may be processed; `false` excludes it.

use crate::error::{Error, Result};
use crate::grid::Grid;

/// Boolean 2D grid indexed by `(row, col)`, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    rows: u32,
    cols: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Create a mask with every cell set to `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if `rows` or `cols` is 0.
    pub fn new(rows: u32, cols: u32, value: bool) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimension {
                rows,
                cols,
                bands: 1,
            });
        }
        Ok(Mask {
            rows,
            cols,
            data: vec![value; (rows as usize) * (cols as usize)],
        })
    }

    /// Create a mask from row-major data
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or the data length doesn't
    /// match `rows * cols`.
    pub fn from_data(rows: u32, cols: u32, data: Vec<bool>) -> Result<Self> {
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
        Ok(Mask { rows, cols, data })
    }

    /// Build a mask from a grid: nonzero (and non-NaN) values become `true`.
    pub fn from_grid(grid: &Grid) -> Self {
        let (rows, cols) = grid.dimensions();
        Mask {
            rows,
            cols,
            data: grid.data().iter().map(|&v| v != 0.0 && !v.is_nan()).collect(),
        }
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

    /// Get the value at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    pub fn get(&self, row: u32, col: u32) -> Result<bool> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: (row as usize) * (self.cols as usize) + (col as usize),
                len: self.data.len(),
            });
        }
        Ok(self.get_unchecked(row, col))
    }

    /// Get the value at `(row, col)` without bounds checking
    #[inline]
    pub fn get_unchecked(&self, row: u32, col: u32) -> bool {
        self.data[(row as usize) * (self.cols as usize) + (col as usize)]
    }

    /// Set the value at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    pub fn set(&mut self, row: u32, col: u32, value: bool) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: (row as usize) * (self.cols as usize) + (col as usize),
                len: self.data.len(),
            });
        }
        self.data[(row as usize) * (self.cols as usize) + (col as usize)] = value;
        Ok(())
    }

    /// Raw row-major values
    #[inline]
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Number of `true` cells
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_new() {
        let mask = Mask::new(3, 4, true).unwrap();
        assert_eq!(mask.dimensions(), (3, 4));
        assert_eq!(mask.count_true(), 12);
        assert!(Mask::new(0, 4, true).is_err());
    }

    #[test]
    fn test_mask_set_get() {
        let mut mask = Mask::new(2, 2, true).unwrap();
        mask.set(1, 0, false).unwrap();
        assert!(!mask.get(1, 0).unwrap());
        assert!(mask.get(0, 1).unwrap());
        assert!(mask.get(2, 0).is_err());
        assert_eq!(mask.count_true(), 3);
    }

    #[test]
    fn test_mask_from_grid() {
        let grid = Grid::from_data(1, 4, vec![0.0, 2.0, f64::NAN, -1.0]).unwrap();
        let mask = Mask::from_grid(&grid);
        assert_eq!(mask.data(), &[false, true, false, true]);
    }

    #[test]
    fn test_mask_from_data_length() {
        assert!(Mask::from_data(2, 2, vec![true; 3]).is_err());
    }
}
