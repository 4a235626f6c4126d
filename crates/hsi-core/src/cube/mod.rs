//! Cube - Hyperspectral image cube
//!
//! A `Cube` is a 3D array of `f64` values indexed by `(row, col, band)`,
//! with dimensions `rows x cols x bands`. Each spatial position holds one
//! spectrum: a vector of `bands` values.
//!
//! See [`serial`] for serialization support.
//!
//! # Examples
//!
//! ```
//! use hsi_core::Cube;
//!
//! let mut cube = Cube::new(8, 6, 4).unwrap();
//! cube.set_value(2, 3, 1, 0.25).unwrap();
//! assert_eq!(cube.spectrum(2, 3).unwrap(), &[0.0, 0.25, 0.0, 0.0]);
//! ```

pub mod serial;

use crate::error::{Error, Result};
use crate::grid::Grid;

/// Hyperspectral image cube
///
/// # Memory Layout
///
/// Band-interleaved-by-pixel: spectra are contiguous and stored in
/// row-major pixel order. The value at `(row, col, band)` is at index
/// `(row * cols + col) * bands + band`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    rows: u32,
    cols: u32,
    bands: u32,
    data: Vec<f64>,
}

impl Cube {
    /// Create a new cube with all values set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if any dimension is 0.
    pub fn new(rows: u32, cols: u32, bands: u32) -> Result<Self> {
        Self::new_with_value(rows, cols, bands, 0.0)
    }

    /// Create a new cube with all values set to `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if any dimension is 0.
    pub fn new_with_value(rows: u32, cols: u32, bands: u32, value: f64) -> Result<Self> {
        check_dimensions(rows, cols, bands)?;
        let size = (rows as usize) * (cols as usize) * (bands as usize);
        Ok(Cube {
            rows,
            cols,
            bands,
            data: vec![value; size],
        })
    }

    /// Create a cube from band-interleaved-by-pixel data
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or the data length doesn't
    /// match `rows * cols * bands`.
    pub fn from_data(rows: u32, cols: u32, bands: u32, data: Vec<f64>) -> Result<Self> {
        check_dimensions(rows, cols, bands)?;
        let expected_size = (rows as usize) * (cols as usize) * (bands as usize);
        if data.len() != expected_size {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{}x{} = {}",
                data.len(),
                rows,
                cols,
                bands,
                expected_size
            )));
        }
        Ok(Cube {
            rows,
            cols,
            bands,
            data,
        })
    }

    /// Stack single-band grids into a cube, one grid per band
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if `bands` is empty and
    /// `Error::DimensionMismatch` if the grids disagree in shape.
    pub fn from_bands(bands: &[Grid]) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| Error::InvalidParameter("no bands to stack".into()))?;
        let (rows, cols) = first.dimensions();
        if let Some(bad) = bands.iter().find(|b| b.dimensions() != (rows, cols)) {
            return Err(Error::DimensionMismatch {
                expected: (rows, cols),
                actual: bad.dimensions(),
            });
        }

        let nbands = bands.len();
        let npixels = (rows as usize) * (cols as usize);
        let mut data = vec![0.0; npixels * nbands];
        for (b, grid) in bands.iter().enumerate() {
            for (pixel, &val) in grid.data().iter().enumerate() {
                data[pixel * nbands + b] = val;
            }
        }

        let nbands = u32::try_from(nbands)
            .map_err(|_| Error::InvalidParameter(format!("too many bands: {nbands}")))?;
        Cube::from_data(rows, cols, nbands, data)
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

    /// Number of spectral bands
    #[inline]
    pub fn bands(&self) -> u32 {
        self.bands
    }

    /// Dimensions as `(rows, cols, bands)`
    #[inline]
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.rows, self.cols, self.bands)
    }

    /// Spatial dimensions as `(rows, cols)`
    #[inline]
    pub fn spatial_dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    #[inline]
    fn pixel_offset(&self, row: u32, col: u32) -> usize {
        ((row as usize) * (self.cols as usize) + (col as usize)) * (self.bands as usize)
    }

    fn check_pixel(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: self.pixel_offset(row, col),
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Get the value at `(row, col, band)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if any coordinate is out of range.
    pub fn get_value(&self, row: u32, col: u32, band: u32) -> Result<f64> {
        self.check_pixel(row, col)?;
        if band >= self.bands {
            return Err(Error::IndexOutOfBounds {
                index: band as usize,
                len: self.bands as usize,
            });
        }
        Ok(self.data[self.pixel_offset(row, col) + band as usize])
    }

    /// Set the value at `(row, col, band)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if any coordinate is out of range.
    pub fn set_value(&mut self, row: u32, col: u32, band: u32, value: f64) -> Result<()> {
        self.check_pixel(row, col)?;
        if band >= self.bands {
            return Err(Error::IndexOutOfBounds {
                index: band as usize,
                len: self.bands as usize,
            });
        }
        let idx = self.pixel_offset(row, col) + band as usize;
        self.data[idx] = value;
        Ok(())
    }

    /// Spectrum at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if the position is out of range.
    pub fn spectrum(&self, row: u32, col: u32) -> Result<&[f64]> {
        self.check_pixel(row, col)?;
        Ok(self.spectrum_unchecked(row, col))
    }

    /// Spectrum at `(row, col)` without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if the position falls outside the data.
    #[inline]
    pub fn spectrum_unchecked(&self, row: u32, col: u32) -> &[f64] {
        let start = self.pixel_offset(row, col);
        &self.data[start..start + self.bands as usize]
    }

    /// Mutable spectrum at `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if the position is out of range.
    pub fn spectrum_mut(&mut self, row: u32, col: u32) -> Result<&mut [f64]> {
        self.check_pixel(row, col)?;
        let start = self.pixel_offset(row, col);
        let bands = self.bands as usize;
        Ok(&mut self.data[start..start + bands])
    }

    /// Set every band of `(row, col)` from `spectrum`
    ///
    /// # Errors
    ///
    /// Returns an error if the position is out of range or `spectrum` has
    /// the wrong length.
    pub fn set_spectrum(&mut self, row: u32, col: u32, spectrum: &[f64]) -> Result<()> {
        if spectrum.len() != self.bands as usize {
            return Err(Error::InvalidParameter(format!(
                "spectrum length {} doesn't match band count {}",
                spectrum.len(),
                self.bands
            )));
        }
        self.spectrum_mut(row, col)?.copy_from_slice(spectrum);
        Ok(())
    }

    /// Extract one band as a grid
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if `band >= bands`.
    pub fn band(&self, band: u32) -> Result<Grid> {
        if band >= self.bands {
            return Err(Error::IndexOutOfBounds {
                index: band as usize,
                len: self.bands as usize,
            });
        }
        let values = self
            .data
            .iter()
            .skip(band as usize)
            .step_by(self.bands as usize)
            .copied()
            .collect();
        Grid::from_data(self.rows, self.cols, values)
    }

    /// Raw band-interleaved-by-pixel data
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw band-interleaved-by-pixel data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Multiply every value by `factor`
    pub fn scale(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|v| *v *= factor);
    }

    /// Copy of the cube with every value multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.scale(factor);
        out
    }
}

fn check_dimensions(rows: u32, cols: u32, bands: u32) -> Result<()> {
    if rows == 0 || cols == 0 || bands == 0 {
        return Err(Error::InvalidDimension { rows, cols, bands });
    }
    Ok(())
}
