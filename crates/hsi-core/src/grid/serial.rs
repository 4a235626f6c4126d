//! Serialization for Grid
//!
//! # Format
//!
//! ```text
//! \nGrid Version 1\n
//! rows = R, cols = C\n
//! nbytes = N\n
//! <raw f64 data, little-endian, row-major, N bytes>
//! \n
//! ```

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::serial::{Header, decode_f64_payload, read_limited};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Grid format version
const GRID_VERSION: i32 = 1;

/// Maximum value count for a Grid (2^28)
const MAX_GRID_VALUES: u64 = 1 << 28;

impl Grid {
    /// Read a Grid from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> Result<Self> {
        let buf = read_limited(reader)?;
        Self::read_from_bytes(&buf)
    }

    /// Read a Grid from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_from_reader(&mut BufReader::new(file))
    }

    /// Read a Grid from a byte slice.
    pub fn read_from_bytes(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data, "Grid", GRID_VERSION)?;
        let rows: u32 = header.field("rows")?;
        let cols: u32 = header.field("cols")?;
        let nbytes: u64 = header.field("nbytes")?;

        let count = rows as u64 * cols as u64;
        if count > MAX_GRID_VALUES {
            return Err(Error::DecodeError(format!(
                "Grid too large: {count} values exceeds maximum {MAX_GRID_VALUES}"
            )));
        }
        if nbytes != count * 8 {
            return Err(Error::DecodeError(format!(
                "Grid nbytes mismatch: header says {nbytes} but rows*cols*8 = {}",
                count * 8
            )));
        }

        let values = decode_f64_payload(data, header.data_start, count as usize)?;
        Grid::from_data(rows, cols, values)
            .map_err(|e| Error::DecodeError(format!("invalid Grid: {e}")))
    }

    /// Write a Grid to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> Result<()> {
        let nbytes = self.data.len() as u64 * 8;
        writeln!(writer, "\nGrid Version {GRID_VERSION}")?;
        writeln!(writer, "rows = {}, cols = {}", self.rows, self.cols)?;
        writeln!(writer, "nbytes = {nbytes}")?;

        for &val in &self.data {
            writer.write_all(&val.to_le_bytes())?;
        }

        writeln!(writer)?;
        Ok(())
    }

    /// Write a Grid to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a Grid to a byte vector.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }
}
