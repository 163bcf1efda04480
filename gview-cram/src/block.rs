//! CRAM block header parsing and payload decompression.

use std::io::Read;

use flate2::read::GzDecoder;
use gview_core::error::{Error, Result};

use crate::codecs::rans;
use crate::io::read_itf8;

/// The content a block carries, identified by its `contentType` byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    /// The embedded SAM header text.
    FileHeader,
    /// The container's compression header.
    CompressionHeader,
    /// A slice header.
    SliceHeader,
    /// Reserved; not produced by any known writer.
    Reserved,
    /// An externally addressed data-series block.
    External,
    /// The CORE (bit-packed) data-series block.
    Core,
}

impl ContentType {
    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::FileHeader),
            1 => Ok(Self::CompressionHeader),
            2 => Ok(Self::SliceHeader),
            3 => Ok(Self::Reserved),
            4 => Ok(Self::External),
            5 => Ok(Self::Core),
            _ => Err(Error::DecompressionFailure {
                reason: format!("unknown block content type {b}"),
            }),
        }
    }
}

/// A decoded CRAM block: its content type, content id (for external
/// blocks), and decompressed payload.
#[derive(Clone, Debug)]
pub struct Block {
    /// What this block carries.
    pub content_type: ContentType,
    /// Distinguishes external blocks with the same content type (data
    /// series key, hashed to an integer, or tag block id).
    pub content_id: i32,
    /// The decompressed payload.
    pub data: Vec<u8>,
}

/// Reads one block header + payload from `reader`, decompressing per its
/// declared method. The trailing CRC32 is read and discarded.
pub fn read_block<R: Read>(reader: &mut R) -> Result<Block> {
    let method = read_u8(reader)?;
    let content_type = ContentType::from_byte(read_u8(reader)?)?;
    let content_id = read_itf8(reader)?;
    let compressed_size = read_itf8(reader)? as usize;
    let uncompressed_size = read_itf8(reader)? as usize;

    let mut compressed = vec![0u8; compressed_size];
    reader.read_exact(&mut compressed).map_err(|_| Error::UnexpectedEof)?;

    let mut crc = [0u8; 4];
    reader.read_exact(&mut crc).map_err(|_| Error::UnexpectedEof)?;

    let data = decompress(method, &compressed, uncompressed_size)?;

    Ok(Block {
        content_type,
        content_id,
        data,
    })
}

fn decompress(method: u8, compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    match method {
        0 => Ok(compressed.to_vec()),
        1 => {
            let mut decoder = GzDecoder::new(compressed);
            let mut out = Vec::with_capacity(uncompressed_size);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::DecompressionFailure {
                    reason: e.to_string(),
                })?;
            Ok(out)
        }
        4 => rans::decode(compressed),
        other => Err(Error::DecompressionFailure {
            reason: format!("unsupported block compression method {other}"),
        }),
    }
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
    fn test_read_raw_block() {
        let payload = b"hello cram";
        let mut data = Vec::new();
        data.push(0); // method = raw
        data.push(4); // content type = external
        data.push(7); // content id (itf8, 1 byte)
        data.push(payload.len() as u8); // compressed size
        data.push(payload.len() as u8); // uncompressed size
        data.extend_from_slice(payload);
        data.extend_from_slice(&[0u8; 4]); // crc32

        let block = read_block(&mut &data[..]).unwrap();
        assert_eq!(block.content_type, ContentType::External);
        assert_eq!(block.content_id, 7);
        assert_eq!(block.data, payload);
    }

    #[test]
    fn test_unknown_content_type() {
        let mut data = Vec::new();
        data.push(0);
        data.push(200);
        let err = read_block(&mut &data[..]).unwrap_err();
        assert!(matches!(err, Error::DecompressionFailure { .. }));
    }
}
