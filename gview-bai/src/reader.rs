//! Parsing the BAI binary format.

use std::collections::HashMap;
use std::io::Read;

use gview_bgzf::VirtualPosition;
use gview_core::error::{Error, Result};

use crate::chunk::Chunk;
use crate::index::{Index, ReferenceIndex};

const MAGIC: [u8; 4] = *b"BAI\x01";
/// Pseudo-bin used by samtools for unmapped-read statistics; not a real
/// interval bin and excluded from `reg2bins` queries.
const METADATA_BIN: u32 = 37450;

/// Reads a BAI index from `reader`.
pub fn read_index<R: Read>(reader: &mut R) -> Result<Index> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|_| Error::UnexpectedEof)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic { context: "BAI index" });
    }

    let n_ref = read_i32(reader)? as usize;
    let mut references = Vec::with_capacity(n_ref);

    for _ in 0..n_ref {
        references.push(read_reference(reader)?);
    }

    Ok(Index::new(references))
}

fn read_reference<R: Read>(reader: &mut R) -> Result<ReferenceIndex> {
    let n_bin = read_i32(reader)? as usize;
    let mut bins = HashMap::with_capacity(n_bin);

    for _ in 0..n_bin {
        let bin_number = read_u32(reader)?;
        let n_chunk = read_i32(reader)? as usize;

        let mut chunks = Vec::with_capacity(n_chunk);
        for _ in 0..n_chunk {
            let start = VirtualPosition::from(read_u64(reader)?);
            let end = VirtualPosition::from(read_u64(reader)?);
            chunks.push(Chunk::new(start, end));
        }

        if bin_number != METADATA_BIN {
            bins.insert(bin_number, chunks);
        }
    }

    let n_intv = read_i32(reader)? as usize;
    let mut linear_index = Vec::with_capacity(n_intv);
    for _ in 0..n_intv {
        linear_index.push(VirtualPosition::from(read_u64(reader)?));
    }

    Ok(ReferenceIndex::new(bins, linear_index))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(n_ref: i32, reference_bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&n_ref.to_le_bytes());
        out.extend_from_slice(reference_bytes);
        out
    }

    #[test]
    fn test_read_index_rejects_bad_magic() {
        let bytes = b"XXXX".to_vec();
        let err = read_index(&mut &bytes[..]).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_read_index_one_reference_one_bin_one_chunk() {
        let mut reference_bytes = Vec::new();
        reference_bytes.extend_from_slice(&1i32.to_le_bytes()); // n_bin
        reference_bytes.extend_from_slice(&4681u32.to_le_bytes()); // bin_number
        reference_bytes.extend_from_slice(&1i32.to_le_bytes()); // n_chunk
        reference_bytes.extend_from_slice(&0u64.to_le_bytes()); // chunk start
        reference_bytes.extend_from_slice(&100u64.to_le_bytes()); // chunk end
        reference_bytes.extend_from_slice(&0i32.to_le_bytes()); // n_intv

        let bytes = build(1, &reference_bytes);
        let index = read_index(&mut &bytes[..]).unwrap();

        let chunks = index.chunks(0, 0, 1);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_read_index_excludes_metadata_bin() {
        let mut reference_bytes = Vec::new();
        reference_bytes.extend_from_slice(&1i32.to_le_bytes()); // n_bin
        reference_bytes.extend_from_slice(&METADATA_BIN.to_le_bytes());
        reference_bytes.extend_from_slice(&1i32.to_le_bytes()); // n_chunk
        reference_bytes.extend_from_slice(&0u64.to_le_bytes());
        reference_bytes.extend_from_slice(&100u64.to_le_bytes());
        reference_bytes.extend_from_slice(&0i32.to_le_bytes()); // n_intv

        let bytes = build(1, &reference_bytes);
        let index = read_index(&mut &bytes[..]).unwrap();

        // The metadata pseudo-bin is never returned by reg2bins, so nothing should match.
        assert!(index.chunks(0, 0, 1_000_000_000).is_empty());
    }
}
