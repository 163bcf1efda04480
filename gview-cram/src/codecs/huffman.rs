//! Canonical Huffman decoding for CRAM's HUFFMAN codec (codec id 3).
//!
//! An encoding descriptor supplies an alphabet (symbol values) and a
//! matching array of canonical code lengths; codes are assigned in order
//! of increasing length, lowest symbol first within a length.

use gview_core::error::{Error, Result};

use crate::io::BitReader;

/// A canonical Huffman code table built from an encoding descriptor's
/// alphabet and code-length arrays.
#[derive(Clone, Debug)]
pub struct HuffmanTable {
    codes: Vec<(u32, u32, i32)>,
    single_symbol: Option<i32>,
}

impl HuffmanTable {
    /// Builds a canonical table. A single-symbol alphabet consumes zero
    /// bits per decode, per CRAM's degenerate-table convention.
    pub fn new(symbols: &[i32], lengths: &[u32]) -> Result<Self> {
        if symbols.len() != lengths.len() {
            return Err(Error::DecompressionFailure {
                reason: "huffman symbol/length array length mismatch".to_string(),
            });
        }

        if symbols.len() == 1 {
            return Ok(Self {
                codes: Vec::new(),
                single_symbol: Some(symbols[0]),
            });
        }

        let mut pairs: Vec<(u32, i32)> = lengths.iter().copied().zip(symbols.iter().copied()).collect();
        pairs.sort_by_key(|&(len, sym)| (len, sym));

        let mut codes = Vec::with_capacity(pairs.len());
        let mut code = 0u32;
        let mut prev_len = 0u32;
        for (len, sym) in pairs {
            code <<= len - prev_len;
            codes.push((len, code, sym));
            code += 1;
            prev_len = len;
        }

        Ok(Self {
            codes,
            single_symbol: None,
        })
    }

    /// Decodes the next symbol from `reader`.
    pub fn decode(&self, reader: &mut BitReader) -> Result<i32> {
        if let Some(sym) = self.single_symbol {
            return Ok(sym);
        }

        let mut code = 0u32;
        let mut len = 0u32;
        loop {
            code = (code << 1) | reader.read_bit()?;
            len += 1;
            if let Some(&(_, _, sym)) = self.codes.iter().find(|&&(l, c, _)| l == len && c == code) {
                return Ok(sym);
            }
            if len > 32 {
                return Err(Error::DecompressionFailure {
                    reason: "huffman code exceeds maximum length without match".to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_symbol_consumes_no_bits() {
        let table = HuffmanTable::new(&[42], &[0]).unwrap();
        let mut reader = BitReader::new(Vec::new());
        assert_eq!(table.decode(&mut reader).unwrap(), 42);
    }

    #[test]
    fn test_canonical_three_symbol_table() {
        // symbols 0,1,2 with lengths 1,2,2 -> codes 0, 10, 11
        let table = HuffmanTable::new(&[0, 1, 2], &[1, 2, 2]).unwrap();

        let mut reader = BitReader::new(vec![0b0_10_11_000]);
        assert_eq!(table.decode(&mut reader).unwrap(), 0);
        assert_eq!(table.decode(&mut reader).unwrap(), 1);
        assert_eq!(table.decode(&mut reader).unwrap(), 2);
    }
}
