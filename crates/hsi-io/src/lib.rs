//! hsi-io - Cube, mask and score grid I/O
//!
//! Converts files to and from the in-memory arrays the detector works on:
//!
//! - Cubes from TIFF (one band per page, or interleaved samples) or the
//!   native `Cube` serialization
//! - Masks from a grayscale TIFF or a native `Grid` (nonzero = true)
//! - Score grids to a 32/64-bit float TIFF or the native `Grid`
//!   serialization
//!
//! Formats are detected from magic bytes, not file extensions. TIFF
//! support is behind the default `tiff-format` feature.

mod error;
pub mod format;
#[cfg(feature = "tiff-format")]
pub mod tiff;

pub use error::{IoError, IoResult};
pub use format::{DataFormat, ScoreFormat, detect_format, detect_format_from_bytes};

use hsi_core::{Cube, Grid, Mask};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

/// Read a cube from a file
pub fn read_cube<P: AsRef<Path>>(path: P) -> IoResult<Cube> {
    let path = path.as_ref();
    let cube = match detect_format(path)? {
        DataFormat::Tiff => read_cube_tiff_file(path)?,
        DataFormat::NativeCube => Cube::read_from_file(path)?,
        DataFormat::NativeGrid => Cube::from_bands(&[Grid::read_from_file(path)?])?,
    };
    log::debug!(
        "read cube {}: {}x{}x{}",
        path.display(),
        cube.rows(),
        cube.cols(),
        cube.bands()
    );
    Ok(cube)
}

/// Read a cube from in-memory data
pub fn read_cube_from_bytes(data: &[u8]) -> IoResult<Cube> {
    match detect_format_from_bytes(data)? {
        DataFormat::Tiff => read_cube_tiff_reader(Cursor::new(data)),
        DataFormat::NativeCube => Ok(Cube::read_from_bytes(data)?),
        DataFormat::NativeGrid => Ok(Cube::from_bands(&[Grid::read_from_bytes(data)?])?),
    }
}

/// Read an optional mask from a file
///
/// A zero-length file means "no restriction" and yields `Ok(None)`.
pub fn read_mask<P: AsRef<Path>>(path: P) -> IoResult<Option<Mask>> {
    let path = path.as_ref();
    if std::fs::metadata(path)?.len() == 0 {
        log::debug!("mask {} is empty, no restriction", path.display());
        return Ok(None);
    }
    let mask = match detect_format(path)? {
        DataFormat::Tiff => read_mask_tiff_file(path)?,
        DataFormat::NativeGrid => Mask::from_grid(&Grid::read_from_file(path)?),
        DataFormat::NativeCube => {
            return Err(IoError::UnsupportedFormat(
                "a cube cannot be used as a mask".to_string(),
            ));
        }
    };
    log::debug!(
        "read mask {}: {}x{}, {} true",
        path.display(),
        mask.rows(),
        mask.cols(),
        mask.count_true()
    );
    Ok(Some(mask))
}

/// Read an optional mask from in-memory data
///
/// Empty data yields `Ok(None)`.
pub fn read_mask_from_bytes(data: &[u8]) -> IoResult<Option<Mask>> {
    if data.is_empty() {
        return Ok(None);
    }
    let mask = match detect_format_from_bytes(data)? {
        DataFormat::Tiff => read_mask_tiff_reader(Cursor::new(data))?,
        DataFormat::NativeGrid => Mask::from_grid(&Grid::read_from_bytes(data)?),
        DataFormat::NativeCube => {
            return Err(IoError::UnsupportedFormat(
                "a cube cannot be used as a mask".to_string(),
            ));
        }
    };
    Ok(Some(mask))
}

/// Write a score grid to a file
pub fn write_scores<P: AsRef<Path>>(grid: &Grid, path: P, format: ScoreFormat) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_scores_to_writer(grid, &mut writer, format)?;
    writer.flush()?;
    log::debug!(
        "wrote scores {}: {}x{} as {:?}",
        path.display(),
        grid.rows(),
        grid.cols(),
        format
    );
    Ok(())
}

/// Write a score grid to a byte vector
pub fn write_scores_to_bytes(grid: &Grid, format: ScoreFormat) -> IoResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    write_scores_to_writer(grid, &mut buf, format)?;
    Ok(buf.into_inner())
}

/// Write a cube to a file, as a multipage float TIFF or natively
pub fn write_cube<P: AsRef<Path>>(cube: &Cube, path: P, format: DataFormat) -> IoResult<()> {
    let path = path.as_ref();
    match format {
        DataFormat::NativeCube => cube.write_to_file(path)?,
        DataFormat::Tiff => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_cube_tiff_writer(cube, &mut writer)?;
            writer.flush()?;
        }
        DataFormat::NativeGrid => {
            return Err(IoError::UnsupportedFormat(
                "a cube cannot be written as a grid".to_string(),
            ));
        }
    }
    log::debug!(
        "wrote cube {}: {}x{}x{} as {:?}",
        path.display(),
        cube.rows(),
        cube.cols(),
        cube.bands(),
        format
    );
    Ok(())
}

fn write_scores_to_writer<W: Write + std::io::Seek>(
    grid: &Grid,
    writer: &mut W,
    format: ScoreFormat,
) -> IoResult<()> {
    match format {
        ScoreFormat::Native => Ok(grid.write_to_writer(writer)?),
        ScoreFormat::TiffF32 => write_grid_tiff_writer(grid, writer, false),
        ScoreFormat::TiffF64 => write_grid_tiff_writer(grid, writer, true),
    }
}

#[cfg(feature = "tiff-format")]
mod tiff_dispatch {
    use super::*;
    use crate::tiff::{
        FloatPrecision, read_cube_tiff, read_mask_tiff, write_cube_tiff, write_grid_tiff,
    };
    use std::io::{Read, Seek};

    pub(super) fn read_cube_tiff_file(path: &Path) -> IoResult<Cube> {
        read_cube_tiff(BufReader::new(File::open(path)?))
    }

    pub(super) fn read_cube_tiff_reader<R: Read + Seek>(reader: R) -> IoResult<Cube> {
        read_cube_tiff(reader)
    }

    pub(super) fn read_mask_tiff_file(path: &Path) -> IoResult<Mask> {
        read_mask_tiff(BufReader::new(File::open(path)?))
    }

    pub(super) fn read_mask_tiff_reader<R: Read + Seek>(reader: R) -> IoResult<Mask> {
        read_mask_tiff(reader)
    }

    pub(super) fn write_grid_tiff_writer<W: Write + Seek>(
        grid: &Grid,
        writer: W,
        double: bool,
    ) -> IoResult<()> {
        let precision = if double {
            FloatPrecision::F64
        } else {
            FloatPrecision::F32
        };
        write_grid_tiff(grid, writer, precision)
    }

    pub(super) fn write_cube_tiff_writer<W: Write + Seek>(cube: &Cube, writer: W) -> IoResult<()> {
        write_cube_tiff(cube, writer)
    }
}

#[cfg(not(feature = "tiff-format"))]
mod tiff_dispatch {
    use super::*;
    use std::io::{Read, Seek};

    fn disabled<T>() -> IoResult<T> {
        Err(IoError::UnsupportedFormat(
            "TIFF support requires the 'tiff-format' feature".to_string(),
        ))
    }

    pub(super) fn read_cube_tiff_file(_path: &Path) -> IoResult<Cube> {
        disabled()
    }

    pub(super) fn read_cube_tiff_reader<R: Read + Seek>(_reader: R) -> IoResult<Cube> {
        disabled()
    }

    pub(super) fn read_mask_tiff_file(_path: &Path) -> IoResult<Mask> {
        disabled()
    }

    pub(super) fn read_mask_tiff_reader<R: Read + Seek>(_reader: R) -> IoResult<Mask> {
        disabled()
    }

    pub(super) fn write_grid_tiff_writer<W: Write + Seek>(
        _grid: &Grid,
        _writer: W,
        _double: bool,
    ) -> IoResult<()> {
        disabled()
    }

    pub(super) fn write_cube_tiff_writer<W: Write + Seek>(_cube: &Cube, _writer: W) -> IoResult<()> {
        disabled()
    }
}

use tiff_dispatch::{
    read_cube_tiff_file, read_cube_tiff_reader, read_mask_tiff_file, read_mask_tiff_reader,
    write_cube_tiff_writer, write_grid_tiff_writer,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_is_no_restriction() {
        assert!(read_mask_from_bytes(&[]).unwrap().is_none());
    }

    #[test]
    fn test_native_grid_as_mask() {
        let grid = Grid::from_data(2, 2, vec![0.0, 1.0, -3.0, f64::NAN]).unwrap();
        let bytes = grid.write_to_bytes().unwrap();
        let mask = read_mask_from_bytes(&bytes).unwrap().unwrap();
        assert_eq!(mask.data(), &[false, true, true, false]);
    }

    #[test]
    fn test_native_cube_is_not_a_mask() {
        let cube = Cube::new(2, 2, 1).unwrap();
        let bytes = cube.write_to_bytes().unwrap();
        assert!(matches!(
            read_mask_from_bytes(&bytes),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_native_scores_roundtrip() {
        let grid = Grid::from_data(2, 3, vec![0.0, 1.5, 2.0, 0.0, 7.25, 0.0]).unwrap();
        let bytes = write_scores_to_bytes(&grid, ScoreFormat::Native).unwrap();
        assert_eq!(Grid::read_from_bytes(&bytes).unwrap(), grid);
    }

    #[test]
    fn test_native_grid_as_single_band_cube() {
        let grid = Grid::from_data(1, 2, vec![3.0, 4.0]).unwrap();
        let cube = read_cube_from_bytes(&grid.write_to_bytes().unwrap()).unwrap();
        assert_eq!(cube.dimensions(), (1, 2, 1));
        assert_eq!(cube.spectrum(0, 1).unwrap(), &[4.0]);
    }

    #[cfg(feature = "tiff-format")]
    #[test]
    fn test_tiff_scores_roundtrip() {
        let grid = Grid::from_data(2, 2, vec![0.0, 0.5, 1.0 / 3.0, 9.0]).unwrap();
        let bytes = write_scores_to_bytes(&grid, ScoreFormat::TiffF64).unwrap();
        assert_eq!(detect_format_from_bytes(&bytes).unwrap(), DataFormat::Tiff);
        let cube = read_cube_from_bytes(&bytes).unwrap();
        assert_eq!(cube.band(0).unwrap(), grid);
    }
}
