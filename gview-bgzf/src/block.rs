//! Parsing and decompressing a single BGZF block (gzip member).

use std::io::{self, Read};

use flate2::bufread::DeflateDecoder;
use gview_core::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [31, 139];
const CM_DEFLATE: u8 = 8;
const FEXTRA_FLAG: u8 = 0x04;
const BC_SUBFIELD_SI1: u8 = 66;
const BC_SUBFIELD_SI2: u8 = 67;

/// Maximum decompressed size of a single BGZF block (64 KiB).
pub const MAX_UNCOMPRESSED_SIZE: usize = 65_536;

/// A decompressed BGZF block plus its total size on disk.
pub struct DecodedBlock {
    /// The decompressed payload, at most [`MAX_UNCOMPRESSED_SIZE`] bytes.
    pub data: Vec<u8>,
    /// The number of compressed bytes this block occupied on disk
    /// (`BSIZE + 1`).
    pub block_length: u64,
    /// Whether this was the empty terminal EOF marker block.
    pub is_eof: bool,
}

/// Reads and decompresses one BGZF block from `reader`.
pub fn read_block<R: Read>(reader: &mut R) -> Result<DecodedBlock> {
    let mut header = [0u8; 12];
    match read_exact_or_eof(reader, &mut header)? {
        None => {
            return Err(Error::UnexpectedEof);
        }
        Some(0) => {
            return Err(Error::UnexpectedEof);
        }
        Some(_) => {}
    }

    if header[0..2] != GZIP_MAGIC {
        return Err(Error::InvalidBgzfBlock {
            reason: "bad gzip magic",
        });
    }

    if header[2] != CM_DEFLATE {
        return Err(Error::InvalidBgzfBlock {
            reason: "unsupported compression method",
        });
    }

    let flg = header[3];
    if flg & FEXTRA_FLAG == 0 {
        return Err(Error::InvalidBgzfBlock {
            reason: "missing FEXTRA flag",
        });
    }

    let xlen = u16::from_le_bytes([header[10], header[11]]) as usize;

    let mut extra = vec![0u8; xlen];
    reader.read_exact(&mut extra).map_err(|_| Error::UnexpectedEof)?;

    let bsize = find_bc_subfield(&extra)?;
    let block_length = u64::from(bsize) + 1;

    let header_len = 12 + xlen;
    let trailer_len = 8;
    let compressed_len = (block_length as usize)
        .checked_sub(header_len)
        .and_then(|n| n.checked_sub(trailer_len))
        .ok_or(Error::InvalidBgzfBlock {
            reason: "block length smaller than header + trailer",
        })?;

    let mut compressed = vec![0u8; compressed_len];
    reader
        .read_exact(&mut compressed)
        .map_err(|_| Error::UnexpectedEof)?;

    let mut trailer = [0u8; 8];
    reader
        .read_exact(&mut trailer)
        .map_err(|_| Error::UnexpectedEof)?;
    let isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]) as usize;

    if isize == 0 {
        return Ok(DecodedBlock {
            data: Vec::new(),
            block_length,
            is_eof: true,
        });
    }

    let mut decoder = DeflateDecoder::new(compressed.as_slice());
    let mut data = Vec::with_capacity(isize);
    decoder
        .read_to_end(&mut data)
        .map_err(|e| Error::DecompressionFailure {
            reason: e.to_string(),
        })?;

    if data.len() != isize {
        return Err(Error::DecompressionFailure {
            reason: format!("expected {isize} decompressed bytes, got {}", data.len()),
        });
    }

    Ok(DecodedBlock {
        data,
        block_length,
        is_eof: false,
    })
}

fn find_bc_subfield(extra: &[u8]) -> Result<u16> {
    let mut i = 0;

    while i + 4 <= extra.len() {
        let si1 = extra[i];
        let si2 = extra[i + 1];
        let slen = u16::from_le_bytes([extra[i + 2], extra[i + 3]]) as usize;
        let data_start = i + 4;

        if si1 == BC_SUBFIELD_SI1 && si2 == BC_SUBFIELD_SI2 && slen == 2 {
            if data_start + 2 > extra.len() {
                return Err(Error::InvalidBgzfBlock {
                    reason: "truncated BC subfield",
                });
            }
            return Ok(u16::from_le_bytes([extra[data_start], extra[data_start + 1]]));
        }

        i = data_start + slen;
    }

    Err(Error::InvalidBgzfBlock {
        reason: "missing BC subfield",
    })
}

/// Like `read_exact`, but distinguishes a clean EOF (no bytes read at all)
/// from a short read.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<Option<usize>> {
    let mut total = 0;

    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => {
                if total == 0 {
                    return Ok(None);
                }
                return Err(Error::UnexpectedEof);
            }
            Ok(n) => total += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }

    Ok(Some(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn make_block(payload: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();

        let xlen: u16 = 6;
        let header_len = 12 + xlen as usize;
        let trailer_len = 8;
        let block_length = header_len + compressed.len() + trailer_len;
        let bsize = (block_length - 1) as u16;

        let mut out = Vec::new();
        out.extend_from_slice(&GZIP_MAGIC);
        out.push(CM_DEFLATE);
        out.push(FEXTRA_FLAG);
        out.extend_from_slice(&[0, 0, 0, 0]); // MTIME
        out.push(0); // XFL
        out.push(0xff); // OS
        out.extend_from_slice(&xlen.to_le_bytes());
        out.push(BC_SUBFIELD_SI1);
        out.push(BC_SUBFIELD_SI2);
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&bsize.to_le_bytes());
        out.extend_from_slice(&compressed);

        let crc = crc32(payload);
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());

        out
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut hasher = flate2::Crc::new();
        hasher.update(data);
        hasher.sum()
    }

    #[test]
    fn test_read_block_round_trip() {
        let payload = b"hello, bgzf world!".repeat(10);
        let bytes = make_block(&payload);

        let mut cursor = &bytes[..];
        let block = read_block(&mut cursor).unwrap();

        assert_eq!(block.data, payload);
        assert_eq!(block.block_length, bytes.len() as u64);
        assert!(!block.is_eof);
    }

    #[test]
    fn test_read_block_rejects_bad_magic() {
        let mut bytes = make_block(b"x");
        bytes[0] = 0;
        let mut cursor = &bytes[..];
        let err = read_block(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::InvalidBgzfBlock { .. }));
    }

    #[test]
    fn test_read_eof_marker() {
        let bytes = make_block(b"");
        let mut cursor = &bytes[..];
        let block = read_block(&mut cursor).unwrap();
        assert!(block.is_eof);
        assert!(block.data.is_empty());
    }
}
