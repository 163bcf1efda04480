//! CRAM slice structure: a slice header block followed by one CORE block
//! and zero or more EXTERNAL blocks.

use std::collections::HashMap;
use std::io::Read;

use gview_core::error::{Error, Result};

use crate::block::{self, Block, ContentType};
use crate::codecs::byte_array::ByteStream;
use crate::io::{read_itf8, read_ltf8, BitReader};

/// Reference sequence id meaning "this slice spans more than one
/// reference" (per-record `RI` series selects the actual reference).
pub const MULTI_REFERENCE: i32 = -2;

/// A slice's fixed header fields.
#[derive(Clone, Debug)]
pub struct SliceHeader {
    /// Reference sequence id, or [`MULTI_REFERENCE`].
    pub ref_seq_id: i32,
    /// 1-based leftmost alignment position spanned by the slice.
    pub align_start: i64,
    /// Alignment span spanned by the slice.
    pub align_span: i64,
    /// Number of records in the slice.
    pub num_records: i64,
    /// Running record counter at the start of the slice.
    pub record_counter: i64,
    /// Number of data blocks (CORE + EXTERNAL) following this header.
    pub num_blocks: i32,
    /// Content ids of the external blocks referenced by this slice.
    pub content_ids: Vec<i32>,
    /// Content id of an embedded reference block, or a sentinel when none
    /// is embedded.
    pub embedded_ref_block_id: i32,
    /// MD5 of the slice's reference bases, for verification (unused here).
    pub md5: [u8; 16],
}

fn read_slice_header(data: &[u8]) -> Result<SliceHeader> {
    let mut cursor: &[u8] = data;

    let ref_seq_id = read_itf8(&mut cursor)?;
    let align_start = i64::from(read_itf8(&mut cursor)?);
    let align_span = i64::from(read_itf8(&mut cursor)?);
    let num_records = i64::from(read_itf8(&mut cursor)?);
    let record_counter = read_ltf8(&mut cursor)?;
    let num_blocks = read_itf8(&mut cursor)?;

    let num_content_ids = read_itf8(&mut cursor)? as usize;
    let mut content_ids = Vec::with_capacity(num_content_ids);
    for _ in 0..num_content_ids {
        content_ids.push(read_itf8(&mut cursor)?);
    }

    let embedded_ref_block_id = read_itf8(&mut cursor)?;

    let mut md5 = [0u8; 16];
    cursor.read_exact(&mut md5).map_err(|_| Error::UnexpectedEof)?;

    Ok(SliceHeader {
        ref_seq_id,
        align_start,
        align_span,
        num_records,
        record_counter,
        num_blocks,
        content_ids,
        embedded_ref_block_id,
        md5,
    })
}

impl SliceHeader {
    /// Whether this slice's records may come from more than one reference
    /// sequence (per-record `RI` selects the actual one).
    pub fn is_multi_reference(&self) -> bool {
        self.ref_seq_id == MULTI_REFERENCE
    }

    /// The slice's alignment end, exclusive.
    pub fn align_end(&self) -> i64 {
        self.align_start + self.align_span
    }
}

/// A parsed slice: its header, CORE bit-stream, and EXTERNAL byte-streams
/// keyed by content id.
pub struct Slice {
    /// The slice's fixed header fields.
    pub header: SliceHeader,
    /// The CORE block's bit-packed data, if present.
    pub core: BitReader,
    /// EXTERNAL blocks, keyed by content id.
    pub externals: HashMap<i32, ByteStream>,
}

/// Reads a slice header block followed by its data blocks, classifying
/// each as CORE or EXTERNAL.
pub fn read_slice<R: Read>(reader: &mut R) -> Result<Slice> {
    let header_block = block::read_block(reader)?;
    if header_block.content_type != ContentType::SliceHeader {
        return Err(Error::DecompressionFailure {
            reason: "expected slice header block".to_string(),
        });
    }
    let header = read_slice_header(&header_block.data)?;

    let mut core = BitReader::new(Vec::new());
    let mut externals = HashMap::new();

    for _ in 0..header.num_blocks {
        let block: Block = block::read_block(reader)?;
        match block.content_type {
            ContentType::Core => core = BitReader::new(block.data),
            ContentType::External => {
                externals.insert(block.content_id, ByteStream::new(block.data));
            }
            other => {
                return Err(Error::DecompressionFailure {
                    reason: format!("unexpected block content type {other:?} inside slice"),
                })
            }
        }
    }

    Ok(Slice { header, core, externals })
}
