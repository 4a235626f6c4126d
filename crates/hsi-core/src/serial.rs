//! Shared helpers for the text-header + binary serialization formats
//!
//! Every native format is laid out as:
//!
//! ```text
//! \n<Type> Version V\n
//! key = value, key = value, ...\n
//! key = value, ...\n
//! <raw f64 data, little-endian>
//! \n
//! ```
//!
//! The header is pure ASCII; exactly three non-empty lines precede the
//! binary payload.

use crate::error::{Error, Result};
use std::io::Read;
use std::str::FromStr;

/// Maximum input size in bytes.
pub(crate) const MAX_INPUT_SIZE: u64 = 2_000_000_000;

/// Number of non-empty text lines before the binary payload.
const HEADER_LINES: usize = 3;

/// Read all of `reader`, refusing inputs above [`MAX_INPUT_SIZE`].
pub(crate) fn read_limited(reader: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(MAX_INPUT_SIZE + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_INPUT_SIZE {
        return Err(Error::DecodeError(format!(
            "input too large: exceeds maximum allowed size of {MAX_INPUT_SIZE} bytes"
        )));
    }
    Ok(buf)
}

/// Parsed text header: the `key = value` fields of the two field lines and
/// the byte offset where the binary payload starts.
pub(crate) struct Header {
    fields: Vec<(String, String)>,
    pub(crate) data_start: usize,
}

impl Header {
    /// Parse the header of a `type_name` document and check its version.
    pub(crate) fn parse(data: &[u8], type_name: &str, expected_version: i32) -> Result<Self> {
        let header_end = find_header_end_by_lines(data)?;
        let header_text = std::str::from_utf8(&data[..header_end]).map_err(|e| {
            Error::DecodeError(format!("{type_name} header is not valid UTF-8: {e}"))
        })?;

        let mut lines = header_text.lines().map(str::trim).filter(|l| !l.is_empty());

        let version_prefix = format!("{type_name} Version ");
        let version = lines
            .next()
            .and_then(|l| l.strip_prefix(&version_prefix))
            .ok_or_else(|| Error::DecodeError(format!("{type_name} version line not found")))?;
        let version: i32 = version
            .trim()
            .parse()
            .map_err(|e| Error::DecodeError(format!("failed to parse {type_name} version: {e}")))?;
        if version != expected_version {
            return Err(Error::DecodeError(format!(
                "invalid {type_name} version: {version}"
            )));
        }

        let mut fields = Vec::new();
        for line in lines {
            for part in line.split(',') {
                let (key, value) = part.split_once('=').ok_or_else(|| {
                    Error::DecodeError(format!("missing '=' in {type_name} header field '{part}'"))
                })?;
                fields.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        Ok(Header {
            fields,
            data_start: header_end,
        })
    }

    /// Parse the value of `key`.
    pub(crate) fn field<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let (_, raw) = self
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .ok_or_else(|| Error::DecodeError(format!("missing header field '{key}'")))?;
        raw.parse()
            .map_err(|e| Error::DecodeError(format!("failed to parse {key}: {e}")))
    }
}

/// Find the byte offset where binary data begins.
///
/// Skips leading empty lines and returns the offset right after the
/// newline that ends the third non-empty line.
fn find_header_end_by_lines(data: &[u8]) -> Result<usize> {
    let scan_limit = data.len().min(512);
    let mut content_lines_found = 0;
    let mut pos = 0;

    while pos < scan_limit {
        let Some(offset) = data[pos..scan_limit].iter().position(|&b| b == b'\n') else {
            break;
        };
        let line_end = pos + offset;
        let has_content = data[pos..line_end]
            .iter()
            .any(|&b| b != b' ' && b != b'\r');
        if has_content {
            content_lines_found += 1;
            if content_lines_found == HEADER_LINES {
                return Ok(line_end + 1);
            }
        }
        pos = line_end + 1;
    }
    Err(Error::DecodeError(format!(
        "could not find end of text header (expected {HEADER_LINES} header lines)"
    )))
}

/// Decode `count` little-endian f64 values starting at `start`.
pub(crate) fn decode_f64_payload(data: &[u8], start: usize, count: usize) -> Result<Vec<f64>> {
    let end = start + count * 8;
    if data.len() < end {
        return Err(Error::DecodeError(format!(
            "data truncated: need {end} bytes but only have {}",
            data.len()
        )));
    }
    Ok(data[start..end]
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse_fields() {
        let data = b"\nThing Version 1\na = 3, b = 4\nnbytes = 0\n";
        let header = Header::parse(data, "Thing", 1).unwrap();
        assert_eq!(header.field::<u32>("a").unwrap(), 3);
        assert_eq!(header.field::<u64>("nbytes").unwrap(), 0);
        assert_eq!(header.data_start, data.len());
        assert!(header.field::<u32>("c").is_err());
    }

    #[test]
    fn test_header_wrong_version() {
        let data = b"\nThing Version 2\na = 3\nb = 4\n";
        assert!(Header::parse(data, "Thing", 1).is_err());
    }

    #[test]
    fn test_header_wrong_type() {
        let data = b"\nOther Version 1\na = 3\nb = 4\n";
        assert!(Header::parse(data, "Thing", 1).is_err());
    }

    #[test]
    fn test_payload_truncated() {
        assert!(decode_f64_payload(&[0u8; 12], 0, 2).is_err());
        let values = decode_f64_payload(&1.5f64.to_le_bytes(), 0, 1).unwrap();
        assert_eq!(values, vec![1.5]);
    }
}
