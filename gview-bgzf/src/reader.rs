//! A random-access reader over a BGZF stream, addressed by virtual offset.

use std::io::{Read, Seek, SeekFrom};

use gview_core::error::{Error, Result};

use crate::block::{self, DecodedBlock};
use crate::virtual_position::VirtualPosition;

/// Random-access BGZF reader.
///
/// Decompresses blocks on demand and presents a little-endian byte stream
/// addressed by 64-bit virtual offsets. Mutation (seeking, reading) is
/// single-threaded; callers wanting concurrent access must serialize
/// through an owning worker, as BAM/CRAM decoders do.
pub struct Reader<R> {
    inner: R,
    block_offset: u64,
    block: DecodedBlock,
    position_in_block: usize,
}

impl<R> Reader<R>
where
    R: Read + Seek,
{
    /// Wraps `inner` in a BGZF reader positioned at the start of the file.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            block_offset: 0,
            block: DecodedBlock {
                data: Vec::new(),
                block_length: 0,
                is_eof: true,
            },
            position_in_block: 0,
        }
    }

    /// Seeks to the block whose compressed offset is `vo >> 16`, positioning
    /// the cursor `vo & 0xFFFF` bytes into its decompressed payload. Reuses
    /// the current block if the compressed offset is unchanged.
    pub fn seek(&mut self, vo: VirtualPosition) -> Result<()> {
        let compressed_offset = vo.compressed_offset();

        if compressed_offset != self.block_offset || self.block.block_length == 0 {
            self.load_block_at(compressed_offset)?;
        }

        self.position_in_block = vo.uncompressed_offset() as usize;
        Ok(())
    }

    fn load_block_at(&mut self, compressed_offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(compressed_offset))
            .map_err(Error::Io)?;
        self.block = block::read_block(&mut self.inner)?;
        self.block_offset = compressed_offset;
        self.position_in_block = 0;
        Ok(())
    }

    fn load_next_block(&mut self) -> Result<()> {
        let next_offset = self.block_offset + self.block.block_length;
        self.load_block_at(next_offset)
    }

    /// The current virtual offset: `(block_offset << 16) | position_in_block`.
    pub fn virtual_position(&self) -> VirtualPosition {
        VirtualPosition::new(self.block_offset, self.position_in_block as u16)
    }

    fn next_byte(&mut self) -> Result<u8> {
        loop {
            if self.position_in_block < self.block.data.len() {
                let b = self.block.data[self.position_in_block];
                self.position_in_block += 1;
                return Ok(b);
            }

            if self.block.is_eof {
                return Err(Error::UnexpectedEof);
            }

            self.load_next_block()?;
        }
    }

    /// Reads exactly `n` bytes, failing with [`Error::UnexpectedEof`] if the
    /// stream ends first.
    pub fn read_fully(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.next_byte()?);
        }
        Ok(out)
    }

    /// Discards `n` bytes, transparently crossing block boundaries.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.next_byte()?;
        }
        Ok(())
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.next_byte()
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_fully(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_fully(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_u32().map(|n| n as i32)
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.read_fully(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Releases the underlying reader.
    pub fn close(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gzip_member(payload: &[u8]) -> Vec<u8> {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();

        let xlen: u16 = 6;
        let header_len = 12 + xlen as usize;
        let block_length = header_len + compressed.len() + 8;
        let bsize = (block_length - 1) as u16;

        let mut out = Vec::new();
        out.extend_from_slice(&[31, 139, 8, 0x04, 0, 0, 0, 0, 0, 0xff]);
        out.extend_from_slice(&xlen.to_le_bytes());
        out.extend_from_slice(&[66, 67]);
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&bsize.to_le_bytes());
        out.extend_from_slice(&compressed);

        let mut crc = flate2::Crc::new();
        crc.update(payload);
        out.extend_from_slice(&crc.sum().to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out
    }

    fn eof_marker() -> Vec<u8> {
        gzip_member(&[])
    }

    #[test]
    fn test_read_across_block_boundary() {
        let block1 = gzip_member(b"0123456789");
        let block2 = gzip_member(b"abcdefghij");
        let mut data = block1.clone();
        data.extend_from_slice(&block2);
        data.extend_from_slice(&eof_marker());

        let mut reader = Reader::new(Cursor::new(data));
        reader.seek(VirtualPosition::new(0, 8)).unwrap();

        let bytes = reader.read_fully(4).unwrap();
        assert_eq!(bytes, b"89ab");
    }

    #[test]
    fn test_virtual_position_round_trip() {
        let block1 = gzip_member(b"0123456789");
        let mut data = block1.clone();
        data.extend_from_slice(&eof_marker());

        let mut reader = Reader::new(Cursor::new(data));
        reader.seek(VirtualPosition::new(0, 3)).unwrap();
        reader.read_u8().unwrap();

        let vp = reader.virtual_position();
        assert_eq!(vp.compressed_offset(), 0);
        assert_eq!(vp.uncompressed_offset(), 4);
    }

    #[test]
    fn test_read_fully_unexpected_eof() {
        let mut data = gzip_member(b"ab");
        data.extend_from_slice(&eof_marker());

        let mut reader = Reader::new(Cursor::new(data));
        reader.seek(VirtualPosition::new(0, 0)).unwrap();
        let err = reader.read_fully(10).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof));
    }
}
