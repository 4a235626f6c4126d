//! File format detection
//!
//! Detects formats by examining magic numbers in the file header.

use crate::{IoError, IoResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Magic numbers for format detection
mod magic {
    /// TIFF little-endian: II 2A 00
    pub const TIFF_LE: &[u8] = &[0x49, 0x49, 0x2A, 0x00];

    /// TIFF big-endian: MM 00 2A
    pub const TIFF_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];

    /// BigTIFF little-endian: II 2B 00
    pub const BIGTIFF_LE: &[u8] = &[0x49, 0x49, 0x2B, 0x00];

    /// BigTIFF big-endian: MM 00 2B
    pub const BIGTIFF_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2B];

    /// Native cube serialization
    pub const CUBE: &[u8] = b"\nCube Version";

    /// Native grid serialization
    pub const GRID: &[u8] = b"\nGrid Version";
}

/// Formats understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// TIFF (classic or BigTIFF)
    Tiff,
    /// Native `Cube` serialization
    NativeCube,
    /// Native `Grid` serialization
    NativeGrid,
}

/// Output format of a score grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreFormat {
    /// Single-page 32-bit float TIFF
    TiffF32,
    /// Single-page 64-bit float TIFF
    #[default]
    TiffF64,
    /// Native `Grid` serialization (lossless)
    Native,
}

impl ScoreFormat {
    /// Conventional file extension
    pub fn extension(self) -> &'static str {
        match self {
            ScoreFormat::TiffF32 | ScoreFormat::TiffF64 => "tif",
            ScoreFormat::Native => "grid",
        }
    }
}

/// Detect the format of a file
pub fn detect_format<P: AsRef<Path>>(path: P) -> IoResult<DataFormat> {
    let mut file = File::open(path).map_err(IoError::Io)?;
    let mut header = [0u8; 16];
    let mut filled = 0;
    // short reads are legal; fill as much of the magic buffer as the file allows
    while filled < header.len() {
        let n = file.read(&mut header[filled..]).map_err(IoError::Io)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    detect_format_from_bytes(&header[..filled])
}

/// Detect the format of in-memory data
pub fn detect_format_from_bytes(data: &[u8]) -> IoResult<DataFormat> {
    if data.len() < 4 {
        return Err(IoError::InvalidData(
            "not enough data to detect format".to_string(),
        ));
    }

    if [
        magic::TIFF_LE,
        magic::TIFF_BE,
        magic::BIGTIFF_LE,
        magic::BIGTIFF_BE,
    ]
    .iter()
    .any(|m| data.starts_with(m))
    {
        return Ok(DataFormat::Tiff);
    }
    if data.starts_with(magic::CUBE) {
        return Ok(DataFormat::NativeCube);
    }
    if data.starts_with(magic::GRID) {
        return Ok(DataFormat::NativeGrid);
    }

    Err(IoError::UnsupportedFormat(
        "unrecognized file header".to_string(),
    ))
}
