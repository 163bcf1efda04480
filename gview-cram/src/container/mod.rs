//! CRAM container structure: header, compression header, and the slices
//! that carry the actual records.

pub mod compression_header;
pub mod slice;

use std::io::Read;

use gview_core::error::{Error, Result};

use crate::block::{self, ContentType};
use crate::io::{read_itf8, read_ltf8};

pub use compression_header::CompressionHeader;
pub use slice::Slice;

/// A container's fixed header fields, read before its blocks.
#[derive(Clone, Debug)]
pub struct ContainerHeader {
    /// Byte length of the blocks that follow this header.
    pub length: i32,
    /// Reference sequence id this container's records align to, or one of
    /// the multi-reference (`-2`) / unmapped (`-1`) pseudo-sequence ids.
    pub ref_seq_id: i32,
    /// 1-based leftmost alignment position spanned by the container.
    pub ref_pos: i64,
    /// Alignment span spanned by the container.
    pub align_span: i64,
    /// Number of records in the container.
    pub num_records: i64,
    /// Running record counter at the start of the container.
    pub record_counter: i64,
    /// Number of bases in the container (unused by the decoder, read to
    /// stay positioned correctly).
    pub num_bases: i64,
    /// Number of blocks following the compression header.
    pub num_blocks: i32,
    /// Byte offsets of each slice, relative to the end of the landmark list.
    pub landmarks: Vec<i32>,
}

impl ContainerHeader {
    /// Whether this is the empty End-Of-File marker container (length 0,
    /// all other header fields either absent or zeroed).
    pub fn is_eof_marker(&self) -> bool {
        self.length == 0
    }
}

/// Reads a container header. Returns `Ok(None)` at a clean end of stream
/// (no more bytes before the next header would begin).
pub fn read_container_header<R: Read>(reader: &mut R) -> Result<Option<ContainerHeader>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    }
    let length = i32::from_le_bytes(len_bytes);
    if length == 0 {
        // The canonical CRAM EOF marker: a zero-length container whose
        // remaining header fields are a fixed byte sequence we don't need
        // to interpret, since nothing follows it in a well-formed file.
        return Ok(Some(ContainerHeader {
            length: 0,
            ref_seq_id: -1,
            ref_pos: 0,
            align_span: 0,
            num_records: 0,
            record_counter: 0,
            num_bases: 0,
            num_blocks: 0,
            landmarks: Vec::new(),
        }));
    }

    let ref_seq_id = read_itf8(reader)?;
    let ref_pos = i64::from(read_itf8(reader)?);
    let align_span = i64::from(read_itf8(reader)?);
    let num_records = i64::from(read_itf8(reader)?);
    let record_counter = read_ltf8(reader)?;
    let num_bases = read_ltf8(reader)?;
    let num_blocks = read_itf8(reader)?;

    let num_landmarks = read_itf8(reader)? as usize;
    let mut landmarks = Vec::with_capacity(num_landmarks);
    for _ in 0..num_landmarks {
        landmarks.push(read_itf8(reader)?);
    }

    Ok(Some(ContainerHeader {
        length,
        ref_seq_id,
        ref_pos,
        align_span,
        num_records,
        record_counter,
        num_bases,
        num_blocks,
        landmarks,
    }))
}

/// A fully parsed container: its header, compression header, and slices.
pub struct Container {
    /// The container's fixed header fields.
    pub header: ContainerHeader,
    /// The shared compression header governing every slice in the
    /// container.
    pub compression_header: CompressionHeader,
    /// The container's slices, one per landmark.
    pub slices: Vec<Slice>,
}

/// Reads a full container: header, compression header block, then one
/// slice per landmark.
///
/// Returns `Ok(None)` at a clean end of stream or at the EOF marker
/// container.
pub fn read_container<R: Read>(reader: &mut R) -> Result<Option<Container>> {
    let Some(header) = read_container_header(reader)? else {
        return Ok(None);
    };
    if header.is_eof_marker() {
        return Ok(None);
    }

    let compression_block = block::read_block(reader)?;
    if compression_block.content_type != ContentType::CompressionHeader {
        return Err(Error::DecompressionFailure {
            reason: "expected compression header as container's first block".to_string(),
        });
    }
    let compression_header = CompressionHeader::parse(&compression_block.data)?;

    let mut slices = Vec::with_capacity(header.landmarks.len());
    for _ in &header.landmarks {
        slices.push(slice::read_slice(reader)?);
    }

    Ok(Some(Container {
        header,
        compression_header,
        slices,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_marker_container_stops_iteration() {
        let data = 0i32.to_le_bytes();
        let header = read_container_header(&mut &data[..]).unwrap().unwrap();
        assert!(header.is_eof_marker());
    }

    #[test]
    fn test_clean_eof_returns_none() {
        let data: &[u8] = &[];
        assert!(read_container_header(&mut &data[..]).unwrap().is_none());
    }
}
