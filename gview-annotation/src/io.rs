//! Shared primitive readers/writers for the annotation cache formats: all
//! multi-byte integers are big-endian, and strings use a 16-bit
//! length-prefixed UTF-8 layout.

use std::io::{self, Read, Write};

use gview_core::error::{Error, Result};

pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(buf[0])
}

pub fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    Ok(read_u8(reader)? != 0)
}

pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn read_i64<R: Read>(reader: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(i64::from_be_bytes(buf))
}

/// Reads a UTF-8 string prefixed by its byte length as a big-endian `u16`.
pub fn read_utf<R: Read>(reader: &mut R) -> Result<String> {
    let mut len_bytes = [0u8; 2];
    reader.read_exact(&mut len_bytes).map_err(|_| Error::UnexpectedEof)?;
    let len = u16::from_be_bytes(len_bytes) as usize;

    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes).map_err(|_| Error::UnexpectedEof)?;

    String::from_utf8(bytes).map_err(|_| Error::CacheCorrupt {
        reason: "invalid utf-8 in cache string field".to_string(),
    })
}

/// Reads a UTF string field where an empty string means "absent".
pub fn read_optional_utf<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let s = read_utf(reader)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    write_u8(writer, value as u8)
}

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub fn write_i64<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Writes `s` as a 16-bit length-prefixed UTF-8 string. Panics (via
/// truncation, not an error) is avoided by callers never feeding strings
/// whose UTF-8 byte length exceeds `u16::MAX`; this holds for every field
/// in the formats this crate writes.
pub fn write_utf<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let bytes = s.as_bytes();
    writer.write_all(&(bytes.len() as u16).to_be_bytes())?;
    writer.write_all(bytes)
}

pub fn write_optional_utf<W: Write>(writer: &mut W, s: Option<&str>) -> io::Result<()> {
    write_utf(writer, s.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf_round_trip() {
        let mut buf = Vec::new();
        write_utf(&mut buf, "ENSG00000139618").unwrap();
        let decoded = read_utf(&mut &buf[..]).unwrap();
        assert_eq!(decoded, "ENSG00000139618");
    }

    #[test]
    fn test_optional_utf_empty_is_none() {
        let mut buf = Vec::new();
        write_optional_utf(&mut buf, None).unwrap();
        assert_eq!(read_optional_utf(&mut &buf[..]).unwrap(), None);

        let mut buf = Vec::new();
        write_optional_utf(&mut buf, Some("protein_coding")).unwrap();
        assert_eq!(read_optional_utf(&mut &buf[..]).unwrap(), Some("protein_coding".to_string()));
    }
}
