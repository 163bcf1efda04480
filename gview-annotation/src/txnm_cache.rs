//! The `TXNM` on-disk cache: non-MANE transcripts grouped by gene id.
//!
//! Structurally identical to the transcript half of [`crate::gene_cache`]
//! except there is no MANE flag pair (every transcript here is non-MANE by
//! construction) and genes are keyed by id alone, without coordinates.

use std::io::{Read, Write};

use gview_core::error::{Error, Result};

use crate::gene_cache::Exon;
use crate::io::{read_i64, read_u32, read_utf, write_i64, write_u32, write_utf};

/// `b"TXNM"`, equal to `0x54584E4D` read as a big-endian `u32`.
pub const MAGIC: [u8; 4] = *b"TXNM";

/// One non-MANE transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonManeTranscript {
    /// Transcript id.
    pub id: String,
    /// Transcript name.
    pub name: String,
    /// Transcript start.
    pub start: i64,
    /// Transcript end.
    pub end: i64,
    /// Transcript biotype.
    pub biotype: String,
    /// CDS start, or equal to `start` when non-coding.
    pub cds_start: i64,
    /// CDS end, or equal to `end` when non-coding.
    pub cds_end: i64,
    /// This transcript's exons.
    pub exons: Vec<Exon>,
}

/// One gene's set of non-MANE transcripts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonManeGene {
    /// Stable gene id this entry supplements.
    pub gene_id: String,
    /// Non-MANE transcripts for this gene.
    pub transcripts: Vec<NonManeTranscript>,
}

/// A parsed non-MANE transcript cache.
#[derive(Clone, Debug, PartialEq)]
pub struct TxnmCache {
    /// Format version this cache was written with.
    pub version: u32,
    /// Entries, in file order.
    pub genes: Vec<NonManeGene>,
}

/// Encodes `cache` in the `TXNM` binary layout.
pub fn encode<W: Write>(writer: &mut W, cache: &TxnmCache) -> std::io::Result<()> {
    writer.write_all(&MAGIC)?;
    write_u32(writer, cache.version)?;
    write_u32(writer, cache.genes.len() as u32)?;

    for gene in &cache.genes {
        write_utf(writer, &gene.gene_id)?;
        write_u32(writer, gene.transcripts.len() as u32)?;
        for transcript in &gene.transcripts {
            write_transcript(writer, transcript)?;
        }
    }

    Ok(())
}

fn write_transcript<W: Write>(writer: &mut W, transcript: &NonManeTranscript) -> std::io::Result<()> {
    write_utf(writer, &transcript.id)?;
    write_utf(writer, &transcript.name)?;
    write_i64(writer, transcript.start)?;
    write_i64(writer, transcript.end)?;
    write_utf(writer, &transcript.biotype)?;
    write_i64(writer, transcript.cds_start)?;
    write_i64(writer, transcript.cds_end)?;
    write_u32(writer, transcript.exons.len() as u32)?;
    for exon in &transcript.exons {
        write_i64(writer, exon.start)?;
        write_i64(writer, exon.end)?;
    }
    Ok(())
}

/// Decodes a `TXNM` cache, rejecting wrong magic or a version other than
/// `expected_version`.
pub fn decode<R: Read>(reader: &mut R, expected_version: u32) -> Result<TxnmCache> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|_| Error::UnexpectedEof)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic { context: "non-MANE transcript cache" });
    }

    let version = read_u32(reader)?;
    if version != expected_version {
        return Err(Error::CacheCorrupt {
            reason: format!("txnm cache version {version} does not match expected {expected_version}"),
        });
    }

    let gene_count = read_u32(reader)? as usize;
    let mut genes = Vec::with_capacity(gene_count);

    for _ in 0..gene_count {
        let gene_id = read_utf(reader)?;
        let tx_count = read_u32(reader)? as usize;
        let mut transcripts = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            transcripts.push(read_transcript(reader)?);
        }
        genes.push(NonManeGene { gene_id, transcripts });
    }

    Ok(TxnmCache { version, genes })
}

fn read_transcript<R: Read>(reader: &mut R) -> Result<NonManeTranscript> {
    let id = read_utf(reader)?;
    let name = read_utf(reader)?;
    let start = read_i64(reader)?;
    let end = read_i64(reader)?;
    let biotype = read_utf(reader)?;
    let cds_start = read_i64(reader)?;
    let cds_end = read_i64(reader)?;

    let exon_count = read_u32(reader)? as usize;
    let mut exons = Vec::with_capacity(exon_count);
    for _ in 0..exon_count {
        let start = read_i64(reader)?;
        let end = read_i64(reader)?;
        exons.push(Exon { start, end });
    }

    Ok(NonManeTranscript {
        id,
        name,
        start,
        end,
        biotype,
        cds_start,
        cds_end,
        exons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> TxnmCache {
        TxnmCache {
            version: 1,
            genes: vec![NonManeGene {
                gene_id: "ENSG00000012048".to_string(),
                transcripts: vec![NonManeTranscript {
                    id: "ENST00000471181".to_string(),
                    name: "BRCA1-202".to_string(),
                    start: 43_044_295,
                    end: 43_125_370,
                    biotype: "protein_coding".to_string(),
                    cds_start: 43_045_677,
                    cds_end: 43_095_845,
                    exons: vec![Exon { start: 43_044_295, end: 43_045_802 }],
                }],
            }],
        }
    }

    #[test]
    fn test_round_trip_is_identity() {
        let cache = sample_cache();
        let mut buf = Vec::new();
        encode(&mut buf, &cache).unwrap();
        let decoded = decode(&mut &buf[..], 1).unwrap();
        assert_eq!(decoded, cache);
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let mut buf = Vec::new();
        encode(&mut buf, &sample_cache()).unwrap();
        buf[1] = b'z';
        let err = decode(&mut &buf[..], 1).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut buf = Vec::new();
        encode(&mut buf, &sample_cache()).unwrap();
        let err = decode(&mut &buf[..], 7).unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));
    }
}
