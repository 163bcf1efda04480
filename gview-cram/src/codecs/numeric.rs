//! The bit-packed numeric codecs (BETA, SUBEXP, GOLOMB_RICE, GAMMA) used
//! for CORE-block integer data series.

use gview_core::error::Result;

use crate::io::BitReader;

/// `readBits(numBits) - offset`.
pub fn decode_beta(reader: &mut BitReader, num_bits: u32, offset: i32) -> Result<i32> {
    let value = reader.read_bits(num_bits)? as i32;
    Ok(value - offset)
}

/// Reads a unary prefix `n`; if `n == 0`, read `k` bits directly, else read
/// `n + k - 1` bits and add `1 << (n + k - 1)`. Subtract `offset`.
pub fn decode_subexp(reader: &mut BitReader, k: u32, offset: i32) -> Result<i32> {
    let n = reader.read_unary()?;
    let value = if n == 0 {
        reader.read_bits(k)?
    } else {
        let width = n + k - 1;
        let tail = reader.read_bits(width)?;
        (1u32 << width) + tail
    };
    Ok(value as i32 - offset)
}

/// Unary quotient (count of leading `1` bits) plus a `log2m`-bit remainder.
pub fn decode_golomb_rice(reader: &mut BitReader, log2m: u32, offset: i32) -> Result<i32> {
    let q = reader.read_unary()?;
    let r = reader.read_bits(log2m)?;
    let value = (q << log2m) + r;
    Ok(value as i32 - offset)
}

/// Elias-gamma: `n` leading `0` bits followed by a `1`, then `n` more bits;
/// value is `(1 << n) + tail - 1`, minus `offset`.
pub fn decode_gamma(reader: &mut BitReader, offset: i32) -> Result<i32> {
    let n = reader.read_gamma_prefix()?;
    let tail = if n > 0 { reader.read_bits(n)? } else { 0 };
    let value = (1u32 << n) + tail - 1;
    Ok(value as i32 - offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beta() {
        let mut reader = BitReader::new(vec![0b1010_0000]);
        assert_eq!(decode_beta(&mut reader, 4, 2).unwrap(), 0b1010 - 2);
    }

    #[test]
    fn test_subexp_zero_prefix() {
        // n=0 (one 0 bit), then k=3 bits value 0b101
        let mut reader = BitReader::new(vec![0b0_101_0000]);
        assert_eq!(decode_subexp(&mut reader, 3, 0).unwrap(), 0b101);
    }

    #[test]
    fn test_subexp_nonzero_prefix() {
        // n=1 (one 1 bit then 0), k=2 -> width = 1+2-1=2, tail bits "11" -> 1<<2 + 3 = 7
        let mut reader = BitReader::new(vec![0b1_0_11_0000]);
        assert_eq!(decode_subexp(&mut reader, 2, 0).unwrap(), 7);
    }

    #[test]
    fn test_golomb_rice() {
        // q=2 (two 1 bits then 0), log2m=3, remainder bits "101"
        let mut reader = BitReader::new(vec![0b1_1_0_101_00]);
        assert_eq!(decode_golomb_rice(&mut reader, 3, 0).unwrap(), (2 << 3) + 0b101);
    }

    #[test]
    fn test_gamma() {
        // n=2 leading zeros, then 1, then 2 tail bits "11" -> (1<<2)+3-1=6
        let mut reader = BitReader::new(vec![0b00_1_11_000]);
        assert_eq!(decode_gamma(&mut reader, 0).unwrap(), 6);
    }
}
