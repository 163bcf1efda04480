//! ITF8: CRAM's variable-length (1-5 byte) integer encoding.

use std::io::Read;

use gview_core::error::{Error, Result};

/// Reads an ITF8-encoded integer.
///
/// The number of leading set bits in the first byte (0-4) determines the
/// total encoded length (1-5 bytes); the remaining bits of the first byte
/// and all bits of continuation bytes are concatenated, most significant
/// first, to form the value. The 5th byte (if present) contributes all 8
/// bits (not 4, as the first 4 bytes do with their partial nibble).
pub fn read_itf8<R: Read>(reader: &mut R) -> Result<i32> {
    let b0 = read_u8(reader)?;

    let value: u32 = if b0 & 0x80 == 0 {
        u32::from(b0)
    } else if b0 & 0x40 == 0 {
        let b1 = read_u8(reader)?;
        (u32::from(b0 & 0x7f) << 8) | u32::from(b1)
    } else if b0 & 0x20 == 0 {
        let b1 = read_u8(reader)?;
        let b2 = read_u8(reader)?;
        (u32::from(b0 & 0x3f) << 16) | (u32::from(b1) << 8) | u32::from(b2)
    } else if b0 & 0x10 == 0 {
        let b1 = read_u8(reader)?;
        let b2 = read_u8(reader)?;
        let b3 = read_u8(reader)?;
        (u32::from(b0 & 0x1f) << 24) | (u32::from(b1) << 16) | (u32::from(b2) << 8) | u32::from(b3)
    } else {
        let b1 = read_u8(reader)?;
        let b2 = read_u8(reader)?;
        let b3 = read_u8(reader)?;
        let b4 = read_u8(reader)?;
        (u32::from(b0 & 0x0f) << 28)
            | (u32::from(b1) << 20)
            | (u32::from(b2) << 12)
            | (u32::from(b3) << 4)
            | (u32::from(b4) & 0x0f)
    };

    Ok(value as i32)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(buf[0])
}

/// Encodes `value` as ITF8, for building test fixtures only; no CRAM writer
/// is implemented.
#[cfg(test)]
pub(crate) fn write_itf8_for_test(out: &mut Vec<u8>, value: i32) {
    let v = value as u32;

    if v & !0x7f == 0 {
        out.push(v as u8);
    } else if v & !0x3fff == 0 {
        out.push(0x80 | ((v >> 8) as u8));
        out.push(v as u8);
    } else if v & !0x1f_ffff == 0 {
        out.push(0xc0 | ((v >> 16) as u8));
        out.push((v >> 8) as u8);
        out.push(v as u8);
    } else if v & !0x0fff_ffff == 0 {
        out.push(0xe0 | ((v >> 24) as u8));
        out.push((v >> 16) as u8);
        out.push((v >> 8) as u8);
        out.push(v as u8);
    } else {
        out.push(0xf0 | ((v >> 28) as u8));
        out.push((v >> 20) as u8);
        out.push((v >> 12) as u8);
        out.push((v >> 4) as u8);
        out.push(v as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_itf8_one_byte() {
        let mut data: &[u8] = &[0x42];
        assert_eq!(read_itf8(&mut data).unwrap(), 0x42);
    }

    #[test]
    fn test_read_itf8_two_bytes() {
        let mut data: &[u8] = &[0x80 | 0x01, 0xff];
        assert_eq!(read_itf8(&mut data).unwrap(), (1 << 8) | 0xff);
    }

    #[test]
    fn test_read_itf8_five_bytes() {
        let mut data: &[u8] = &[0xf0, 0x12, 0x34, 0x56, 0x78];
        let value = read_itf8(&mut data).unwrap();
        let expected = (0u32 << 28) | (0x12 << 20) | (0x34 << 12) | (0x56 << 4) | (0x78 & 0x0f);
        assert_eq!(value as u32, expected);
    }

    #[test]
    fn test_write_read_round_trip() {
        for value in [0, 1, 0x7f, 0x80, 0x3fff, 0x4000, 0x1f_ffff, 0x20_0000, i32::MAX] {
            let mut buf = Vec::new();
            write_itf8_for_test(&mut buf, value);
            assert_eq!(read_itf8(&mut &buf[..]).unwrap(), value, "value {value}");
        }
    }
}
