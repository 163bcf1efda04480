//! LTF8: CRAM's variable-length (1-9 byte) 64-bit integer encoding.

use std::io::Read;

use gview_core::error::{Error, Result};

/// Reads an LTF8-encoded 64-bit integer, the same prefix-length scheme as
/// ITF8 extended to 64 bits (up to 9 bytes; the 9th contributes all 8 bits).
pub fn read_ltf8<R: Read>(reader: &mut R) -> Result<i64> {
    let b0 = read_u8(reader)?;

    let value: u64 = if b0 & 0x80 == 0 {
        u64::from(b0)
    } else if b0 & 0x40 == 0 {
        let rest = read_n(reader, 1)?;
        (u64::from(b0 & 0x7f) << 8) | rest
    } else if b0 & 0x20 == 0 {
        let rest = read_n(reader, 2)?;
        (u64::from(b0 & 0x3f) << 16) | rest
    } else if b0 & 0x10 == 0 {
        let rest = read_n(reader, 3)?;
        (u64::from(b0 & 0x1f) << 24) | rest
    } else if b0 & 0x08 == 0 {
        let rest = read_n(reader, 4)?;
        (u64::from(b0 & 0x0f) << 32) | rest
    } else if b0 & 0x04 == 0 {
        let rest = read_n(reader, 5)?;
        (u64::from(b0 & 0x07) << 40) | rest
    } else if b0 & 0x02 == 0 {
        let rest = read_n(reader, 6)?;
        (u64::from(b0 & 0x03) << 48) | rest
    } else if b0 & 0x01 == 0 {
        let rest = read_n(reader, 7)?;
        (u64::from(b0 & 0x01) << 56) | rest
    } else {
        read_n(reader, 8)?
    };

    Ok(value as i64)
}

fn read_n<R: Read>(reader: &mut R, n: usize) -> Result<u64> {
    let mut value: u64 = 0;
    for _ in 0..n {
        value = (value << 8) | u64::from(read_u8(reader)?);
    }
    Ok(value)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(buf[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ltf8_one_byte() {
        let mut data: &[u8] = &[0x42];
        assert_eq!(read_ltf8(&mut data).unwrap(), 0x42);
    }

    #[test]
    fn test_read_ltf8_nine_bytes() {
        let mut data: &[u8] = &[0xff, 1, 2, 3, 4, 5, 6, 7, 8];
        let value = read_ltf8(&mut data).unwrap();
        assert_eq!(value as u64, 0x0102030405060708u64);
    }
}
