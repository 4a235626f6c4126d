//! TIFF support
//!
//! Cubes are stored one band per page. A page with several samples per
//! pixel (RGB, multiband) contributes one band per sample, so both the
//! page-per-band and the interleaved layouts load as a cube. Every page
//! must have the same dimensions.
//!
//! Masks are single-page grayscale images; nonzero means `true`.
//! Score grids are written as single-page float TIFFs.

use crate::{IoError, IoResult};
use hsi_core::{Cube, Grid, Mask};
use std::io::{Read, Seek, Write};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray32Float, Gray64Float};

/// Float precision of a written TIFF page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPrecision {
    /// IEEE single precision
    F32,
    /// IEEE double precision
    F64,
}

/// One decoded page, samples converted to f64
struct Page {
    width: u32,
    height: u32,
    samples: usize,
    values: Vec<f64>,
}

/// Read a cube from a TIFF
pub fn read_cube_tiff<R: Read + Seek>(reader: R) -> IoResult<Cube> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| IoError::DecodeError(format!("TIFF decode error: {}", e)))?;

    let mut pages = Vec::new();
    loop {
        pages.push(decode_page(&mut decoder)?);

        if !decoder.more_images() {
            break;
        }

        decoder
            .next_image()
            .map_err(|e| IoError::DecodeError(format!("TIFF page navigation error: {}", e)))?;
    }

    let (width, height) = (pages[0].width, pages[0].height);
    if let Some((i, p)) = pages
        .iter()
        .enumerate()
        .find(|(_, p)| (p.width, p.height) != (width, height))
    {
        return Err(IoError::InvalidData(format!(
            "TIFF page {} is {}x{}, page 0 is {}x{}",
            i, p.width, p.height, width, height
        )));
    }

    let bands: usize = pages.iter().map(|p| p.samples).sum();
    let bands = u32::try_from(bands)
        .map_err(|_| IoError::InvalidData(format!("too many bands: {}", bands)))?;
    let mut cube = Cube::new(height, width, bands)?;
    let nbands = bands as usize;
    let data = cube.data_mut();

    let mut offset = 0;
    for page in &pages {
        for (p, pixel) in page.values.chunks_exact(page.samples).enumerate() {
            let base = p * nbands + offset;
            data[base..base + page.samples].copy_from_slice(pixel);
        }
        offset += page.samples;
    }

    log::debug!(
        "read TIFF cube: {}x{}x{} from {} page(s)",
        height,
        width,
        bands,
        pages.len()
    );
    Ok(cube)
}

/// Read a mask from the first page of a grayscale TIFF
///
/// Nonzero samples are `true`.
pub fn read_mask_tiff<R: Read + Seek>(reader: R) -> IoResult<Mask> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| IoError::DecodeError(format!("TIFF decode error: {}", e)))?;
    let page = decode_page(&mut decoder)?;
    if page.samples != 1 {
        return Err(IoError::InvalidData(format!(
            "mask must have one sample per pixel, got {}",
            page.samples
        )));
    }
    if decoder.more_images() {
        log::warn!("mask TIFF has more than one page; using the first");
    }

    let data = page.values.iter().map(|&v| v != 0.0 && !v.is_nan()).collect();
    let mask = Mask::from_data(page.height, page.width, data)?;
    log::debug!(
        "read TIFF mask: {}x{}, {} true",
        page.height,
        page.width,
        mask.count_true()
    );
    Ok(mask)
}

/// Write a grid as a single-page float TIFF
pub fn write_grid_tiff<W: Write + Seek>(
    grid: &Grid,
    writer: W,
    precision: FloatPrecision,
) -> IoResult<()> {
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IoError::EncodeError(format!("TIFF encoder error: {}", e)))?;
    write_grid_page(&mut encoder, grid, precision)
}

/// Write a cube as a multipage 64-bit float TIFF, one band per page
pub fn write_cube_tiff<W: Write + Seek>(cube: &Cube, writer: W) -> IoResult<()> {
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IoError::EncodeError(format!("TIFF encoder error: {}", e)))?;
    for b in 0..cube.bands() {
        write_grid_page(&mut encoder, &cube.band(b)?, FloatPrecision::F64)?;
    }
    Ok(())
}

fn write_grid_page<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    grid: &Grid,
    precision: FloatPrecision,
) -> IoResult<()> {
    // TIFF width is the column count
    let (width, height) = (grid.cols(), grid.rows());
    let result = match precision {
        FloatPrecision::F32 => {
            let data: Vec<f32> = grid.data().iter().map(|&v| v as f32).collect();
            encoder.write_image::<Gray32Float>(width, height, &data)
        }
        FloatPrecision::F64 => encoder.write_image::<Gray64Float>(width, height, grid.data()),
    };
    result.map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))
}

/// Samples per pixel and bits per sample of a color type
fn sample_layout(color_type: ColorType) -> IoResult<(usize, u8)> {
    match color_type {
        ColorType::Gray(bits) => Ok((1, bits)),
        ColorType::GrayA(bits) => Ok((2, bits)),
        ColorType::RGB(bits) => Ok((3, bits)),
        ColorType::RGBA(bits) | ColorType::CMYK(bits) => Ok((4, bits)),
        ColorType::Multiband {
            bit_depth,
            num_samples,
        } => Ok((num_samples as usize, bit_depth)),
        _ => Err(IoError::UnsupportedFormat(format!(
            "unsupported TIFF color type: {:?}",
            color_type
        ))),
    }
}

/// Decode the page at the current decoder position
fn decode_page<R: Read + Seek>(decoder: &mut Decoder<R>) -> IoResult<Page> {
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF dimensions: {}", e)))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF color type: {}", e)))?;
    let (samples, bits) = sample_layout(color_type)?;

    let image_data = decoder
        .read_image()
        .map_err(|e| IoError::DecodeError(format!("Failed to read TIFF image data: {}", e)))?;

    let values = match image_data {
        DecodingResult::U8(data) if bits < 8 => {
            if samples != 1 {
                return Err(IoError::UnsupportedFormat(format!(
                    "{}-bit samples are only supported for grayscale",
                    bits
                )));
            }
            unpack_bits(&data, width, height, bits)?
        }
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(IoError::UnsupportedFormat(
                "unsupported TIFF sample format".to_string(),
            ));
        }
    };

    let expected = width as usize * height as usize * samples;
    if values.len() != expected {
        return Err(IoError::InvalidData(format!(
            "TIFF page holds {} samples, expected {}x{}x{}",
            values.len(),
            height,
            width,
            samples
        )));
    }

    Ok(Page {
        width,
        height,
        samples,
        values,
    })
}

/// Unpack 1-, 2- or 4-bit samples; rows are padded to whole bytes
fn unpack_bits(data: &[u8], width: u32, height: u32, bits: u8) -> IoResult<Vec<f64>> {
    if !matches!(bits, 1 | 2 | 4) {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported TIFF bit depth: {}",
            bits
        )));
    }
    let bits = bits as usize;
    let width = width as usize;
    let bytes_per_row = (width * bits).div_ceil(8);
    if data.len() < bytes_per_row * height as usize {
        return Err(IoError::InvalidData(format!(
            "TIFF page too short: {} bytes for {} rows of {} bytes",
            data.len(),
            height,
            bytes_per_row
        )));
    }

    let per_byte = 8 / bits;
    let sample_mask = (1u8 << bits) - 1;
    let mut values = Vec::with_capacity(width * height as usize);
    for row in data.chunks_exact(bytes_per_row).take(height as usize) {
        for x in 0..width {
            let shift = 8 - bits * (x % per_byte + 1);
            let v = (row[x / per_byte] >> shift) & sample_mask;
            values.push(f64::from(v));
        }
    }
    Ok(values)
}
