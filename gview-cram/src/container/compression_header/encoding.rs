//! CRAM encoding descriptors: `(codec_id, params)` pairs that tell a data
//! series decoder which codec to run and with what parameters. Each data
//! series encoding map entry and each tag encoding map entry is one of
//! these.

use std::collections::HashMap;
use std::io::Read;

use gview_core::error::{Error, Result};

use crate::codecs::byte_array::{self, ByteStream};
use crate::codecs::{huffman::HuffmanTable, numeric, rans as _rans};
use crate::io::{read_itf8, BitReader};

/// A parsed encoding descriptor, ready to decode values of its kind.
#[derive(Clone, Debug)]
pub enum Encoding {
    /// Always produces nothing; used for absent optional series.
    Null,
    /// Reads an ITF8 integer from the named external block's byte stream.
    ExternalInt {
        /// The external block's content id.
        content_id: i32,
    },
    /// Reads one raw byte from the named external block's byte stream.
    ExternalByte {
        /// The external block's content id.
        content_id: i32,
    },
    /// Canonical Huffman coding over the CORE bit-stream.
    Huffman {
        /// The symbol table, shared with its code-length array.
        table: HuffmanTable,
    },
    /// A length codec followed by a byte run read from an external stream.
    ByteArrayLen {
        /// Produces the run length.
        len_encoding: Box<Encoding>,
        /// Supplies the external content id bytes are drawn from.
        value_content_id: i32,
    },
    /// Bytes from an external stream up to a stop sentinel.
    ByteArrayStop {
        /// The terminating byte, consumed but not included in the output.
        stop_byte: u8,
        /// The external block's content id.
        content_id: i32,
    },
    /// `readBits(numBits) - offset`.
    Beta {
        /// Subtracted from the decoded value.
        offset: i32,
        /// Number of bits to read.
        num_bits: u32,
    },
    /// Truncated-exponential-Golomb coding.
    SubExp {
        /// Subtracted from the decoded value.
        offset: i32,
        /// The base bit width.
        k: u32,
    },
    /// Golomb-Rice coding.
    GolombRice {
        /// Subtracted from the decoded value.
        offset: i32,
        /// `log2(m)`, the remainder bit width.
        log2m: u32,
    },
    /// Elias-gamma coding.
    Gamma {
        /// Subtracted from the decoded value.
        offset: i32,
    },
}

impl Encoding {
    /// Parses one encoding descriptor (and, for BYTE_ARRAY_LEN, its nested
    /// length encoding) from `reader`.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let codec_id = read_itf8(reader)?;
        let params_len = read_itf8(reader)? as usize;
        let mut params = vec![0u8; params_len];
        reader
            .read_exact(&mut params)
            .map_err(|_| Error::UnexpectedEof)?;
        let mut cursor: &[u8] = &params;

        match codec_id {
            0 => Ok(Self::Null),
            1 => {
                let content_id = read_itf8(&mut cursor)?;
                Ok(Self::ExternalInt { content_id })
            }
            3 => {
                let alphabet_len = read_itf8(&mut cursor)? as usize;
                let mut symbols = Vec::with_capacity(alphabet_len);
                for _ in 0..alphabet_len {
                    symbols.push(read_itf8(&mut cursor)?);
                }
                let lengths_len = read_itf8(&mut cursor)? as usize;
                let mut lengths = Vec::with_capacity(lengths_len);
                for _ in 0..lengths_len {
                    lengths.push(read_itf8(&mut cursor)? as u32);
                }
                let table = HuffmanTable::new(&symbols, &lengths)?;
                Ok(Self::Huffman { table })
            }
            4 => {
                let len_encoding = Box::new(Encoding::parse(&mut cursor)?);
                let value_encoding = Encoding::parse(&mut cursor)?;
                let value_content_id = match value_encoding {
                    Encoding::ExternalInt { content_id } | Encoding::ExternalByte { content_id } => content_id,
                    _ => {
                        return Err(Error::DecompressionFailure {
                            reason: "BYTE_ARRAY_LEN value encoding must be EXTERNAL".to_string(),
                        })
                    }
                };
                Ok(Self::ByteArrayLen {
                    len_encoding,
                    value_content_id,
                })
            }
            5 => {
                let stop_byte = {
                    let mut b = [0u8; 1];
                    cursor.read_exact(&mut b).map_err(|_| Error::UnexpectedEof)?;
                    b[0]
                };
                let content_id = read_itf8(&mut cursor)?;
                Ok(Self::ByteArrayStop { stop_byte, content_id })
            }
            6 => {
                let offset = read_itf8(&mut cursor)?;
                let num_bits = read_itf8(&mut cursor)? as u32;
                Ok(Self::Beta { offset, num_bits })
            }
            7 => {
                let offset = read_itf8(&mut cursor)?;
                let k = read_itf8(&mut cursor)? as u32;
                Ok(Self::SubExp { offset, k })
            }
            8 => {
                let offset = read_itf8(&mut cursor)?;
                let log2m = read_itf8(&mut cursor)? as u32;
                Ok(Self::GolombRice { offset, log2m })
            }
            9 => {
                let offset = read_itf8(&mut cursor)?;
                Ok(Self::Gamma { offset })
            }
            other => Err(Error::DecompressionFailure {
                reason: format!("unknown encoding codec id {other}"),
            }),
        }
    }

    /// Decodes one integer value, pulling from `core` (the CORE block's
    /// bit-stream) or the matching entry of `externals` as required.
    pub fn decode_int(&self, core: &mut BitReader, externals: &mut HashMap<i32, ByteStream>) -> Result<i32> {
        match self {
            Self::Null => Ok(0),
            Self::ExternalInt { content_id } => external_stream(externals, *content_id)?.read_itf8(),
            Self::ExternalByte { content_id } => {
                external_stream(externals, *content_id)?.read_u8().map(i32::from)
            }
            Self::Huffman { table } => table.decode(core),
            Self::Beta { offset, num_bits } => numeric::decode_beta(core, *num_bits, *offset),
            Self::SubExp { offset, k } => numeric::decode_subexp(core, *k, *offset),
            Self::GolombRice { offset, log2m } => numeric::decode_golomb_rice(core, *log2m, *offset),
            Self::Gamma { offset } => numeric::decode_gamma(core, *offset),
            Self::ByteArrayLen { .. } | Self::ByteArrayStop { .. } => Err(Error::DecompressionFailure {
                reason: "byte-array encoding used where an integer was expected".to_string(),
            }),
        }
    }

    /// Decodes one byte-string value.
    pub fn decode_bytes(&self, core: &mut BitReader, externals: &mut HashMap<i32, ByteStream>) -> Result<Vec<u8>> {
        match self {
            Self::ByteArrayLen {
                len_encoding,
                value_content_id,
            } => {
                let len = len_encoding.decode_int(core, externals)? as usize;
                let stream = external_stream(externals, *value_content_id)?;
                byte_array::read_byte_array_len(stream, len)
            }
            Self::ByteArrayStop { stop_byte, content_id } => {
                let stream = external_stream(externals, *content_id)?;
                byte_array::read_byte_array_stop(stream, *stop_byte)
            }
            _ => Err(Error::DecompressionFailure {
                reason: "non-byte-array encoding used where a byte array was expected".to_string(),
            }),
        }
    }
}

fn external_stream(externals: &mut HashMap<i32, ByteStream>, content_id: i32) -> Result<&mut ByteStream> {
    externals.get_mut(&content_id).ok_or_else(|| Error::DecompressionFailure {
        reason: format!("missing external block for content id {content_id}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_descriptor(codec_id: i32, params: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        crate::io::itf8::write_itf8_for_test(&mut out, codec_id);
        crate::io::itf8::write_itf8_for_test(&mut out, params.len() as i32);
        out.extend_from_slice(params);
        out
    }

    #[test]
    fn test_parse_external_int() {
        let mut params = Vec::new();
        crate::io::itf8::write_itf8_for_test(&mut params, 5);
        let data = encode_descriptor(1, &params);
        let encoding = Encoding::parse(&mut &data[..]).unwrap();
        assert!(matches!(encoding, Encoding::ExternalInt { content_id: 5 }));
    }

    #[test]
    fn test_parse_beta_and_decode() {
        let mut params = Vec::new();
        crate::io::itf8::write_itf8_for_test(&mut params, 2); // offset
        crate::io::itf8::write_itf8_for_test(&mut params, 4); // num_bits
        let data = encode_descriptor(6, &params);
        let encoding = Encoding::parse(&mut &data[..]).unwrap();

        let mut core = BitReader::new(vec![0b1010_0000]);
        let mut externals = HashMap::new();
        let value = encoding.decode_int(&mut core, &mut externals).unwrap();
        assert_eq!(value, 0b1010 - 2);
    }

    #[test]
    fn test_byte_array_stop_round_trip() {
        let data = encode_descriptor(5, &[0, 9]); // stop=0, content_id=9
        let encoding = Encoding::parse(&mut &data[..]).unwrap();

        let mut core = BitReader::new(Vec::new());
        let mut externals = HashMap::new();
        externals.insert(9, ByteStream::new(b"abc\0".to_vec()));
        let bytes = encoding.decode_bytes(&mut core, &mut externals).unwrap();
        assert_eq!(bytes, b"abc");
    }
}
