//! Serialization for Cube
//!
//! # Format
//!
//! ```text
//! \nCube Version 1\n
//! rows = R, cols = C, bands = B\n
//! nbytes = N\n
//! <raw f64 data, little-endian, band-interleaved-by-pixel, N bytes>
//! \n
//! ```

use crate::cube::Cube;
use crate::error::{Error, Result};
use crate::serial::{Header, decode_f64_payload, read_limited};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Cube format version
const CUBE_VERSION: i32 = 1;

/// Maximum value count for a Cube (2^28)
const MAX_CUBE_VALUES: u64 = 1 << 28;

impl Cube {
    /// Read a Cube from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> Result<Self> {
        let buf = read_limited(reader)?;
        Self::read_from_bytes(&buf)
    }

    /// Read a Cube from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_from_reader(&mut BufReader::new(file))
    }

    /// Read a Cube from a byte slice.
    pub fn read_from_bytes(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data, "Cube", CUBE_VERSION)?;
        let rows: u32 = header.field("rows")?;
        let cols: u32 = header.field("cols")?;
        let bands: u32 = header.field("bands")?;
        let nbytes: u64 = header.field("nbytes")?;

        let count = u64::from(rows)
            .checked_mul(u64::from(cols))
            .and_then(|v| v.checked_mul(u64::from(bands)))
            .ok_or_else(|| {
                Error::DecodeError(format!(
                    "Cube too large: {rows}x{cols}x{bands} overflows the value count"
                ))
            })?;
        if count > MAX_CUBE_VALUES {
            return Err(Error::DecodeError(format!(
                "Cube too large: {count} values exceeds maximum {MAX_CUBE_VALUES}"
            )));
        }
        if nbytes != count * 8 {
            return Err(Error::DecodeError(format!(
                "Cube nbytes mismatch: header says {nbytes} but rows*cols*bands*8 = {}",
                count * 8
            )));
        }

        let values = decode_f64_payload(data, header.data_start, count as usize)?;
        Cube::from_data(rows, cols, bands, values)
            .map_err(|e| Error::DecodeError(format!("invalid Cube: {e}")))
    }

    /// Write a Cube to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> Result<()> {
        let nbytes = self.data.len() as u64 * 8;
        writeln!(writer, "\nCube Version {CUBE_VERSION}")?;
        writeln!(
            writer,
            "rows = {}, cols = {}, bands = {}",
            self.rows, self.cols, self.bands
        )?;
        writeln!(writer, "nbytes = {nbytes}")?;

        for &val in &self.data {
            writer.write_all(&val.to_le_bytes())?;
        }

        writeln!(writer)?;
        Ok(())
    }

    /// Write a Cube to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a Cube to a byte vector.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }
}
