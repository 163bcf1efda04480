//! The `GENE` on-disk cache: genes, their transcripts (MANE-flagged), and
//! merged exon lists.

use std::io::{Read, Write};

use gview_core::error::{Error, Result};

use crate::io::{read_bool, read_i64, read_optional_utf, read_u32, read_utf, write_bool, write_i64, write_optional_utf, write_u32, write_utf};

/// `b"GENE"`, equal to `0x47454E45` read as a big-endian `u32`.
pub const MAGIC: [u8; 4] = *b"GENE";

/// One exon's span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exon {
    /// Exon start.
    pub start: i64,
    /// Exon end.
    pub end: i64,
}

/// One transcript, with MANE Select/Plus Clinical tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
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
    /// Whether this is the MANE Select transcript.
    pub mane_select: bool,
    /// Whether this is a MANE Plus Clinical transcript.
    pub mane_clinical: bool,
    /// CDS start, or equal to `start` when non-coding.
    pub cds_start: i64,
    /// CDS end, or equal to `end` when non-coding.
    pub cds_end: i64,
    /// This transcript's exons.
    pub exons: Vec<Exon>,
}

/// One gene, with its transcripts and gene-level merged exons.
#[derive(Clone, Debug, PartialEq)]
pub struct Gene {
    /// Reference sequence name.
    pub chrom: String,
    /// Gene start.
    pub start: i64,
    /// Gene end.
    pub end: i64,
    /// Gene symbol.
    pub name: String,
    /// Stable gene id.
    pub id: String,
    /// Strand, e.g. `"+"` or `"-"`.
    pub strand: String,
    /// Gene biotype, if known.
    pub biotype: Option<String>,
    /// Gene description, if known.
    pub description: Option<String>,
    /// This gene's transcripts.
    pub transcripts: Vec<Transcript>,
    /// Exons merged across all transcripts.
    pub exons: Vec<Exon>,
}

/// A parsed gene cache.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneCache {
    /// Format version this cache was written with.
    pub version: u32,
    /// The cached genes, in file order.
    pub genes: Vec<Gene>,
}

/// Encodes `cache` in the `GENE` binary layout.
pub fn encode<W: Write>(writer: &mut W, cache: &GeneCache) -> std::io::Result<()> {
    writer.write_all(&MAGIC)?;
    write_u32(writer, cache.version)?;
    write_u32(writer, cache.genes.len() as u32)?;

    for gene in &cache.genes {
        write_utf(writer, &gene.chrom)?;
        write_i64(writer, gene.start)?;
        write_i64(writer, gene.end)?;
        write_utf(writer, &gene.name)?;
        write_utf(writer, &gene.id)?;
        write_utf(writer, &gene.strand)?;
        write_optional_utf(writer, gene.biotype.as_deref())?;
        write_optional_utf(writer, gene.description.as_deref())?;

        write_u32(writer, gene.transcripts.len() as u32)?;
        for transcript in &gene.transcripts {
            write_transcript(writer, transcript)?;
        }

        write_u32(writer, gene.exons.len() as u32)?;
        for exon in &gene.exons {
            write_exon(writer, exon)?;
        }
    }

    Ok(())
}

fn write_transcript<W: Write>(writer: &mut W, transcript: &Transcript) -> std::io::Result<()> {
    write_utf(writer, &transcript.id)?;
    write_utf(writer, &transcript.name)?;
    write_i64(writer, transcript.start)?;
    write_i64(writer, transcript.end)?;
    write_utf(writer, &transcript.biotype)?;
    write_bool(writer, transcript.mane_select)?;
    write_bool(writer, transcript.mane_clinical)?;
    write_i64(writer, transcript.cds_start)?;
    write_i64(writer, transcript.cds_end)?;
    write_u32(writer, transcript.exons.len() as u32)?;
    for exon in &transcript.exons {
        write_exon(writer, exon)?;
    }
    Ok(())
}

fn write_exon<W: Write>(writer: &mut W, exon: &Exon) -> std::io::Result<()> {
    write_i64(writer, exon.start)?;
    write_i64(writer, exon.end)
}

/// Decodes a `GENE` cache, rejecting wrong magic or a version other than
/// `expected_version`.
pub fn decode<R: Read>(reader: &mut R, expected_version: u32) -> Result<GeneCache> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|_| Error::UnexpectedEof)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic { context: "gene annotation cache" });
    }

    let version = read_u32(reader)?;
    if version != expected_version {
        return Err(Error::CacheCorrupt {
            reason: format!("gene cache version {version} does not match expected {expected_version}"),
        });
    }

    let gene_count = read_u32(reader)? as usize;
    let mut genes = Vec::with_capacity(gene_count);

    for _ in 0..gene_count {
        let chrom = read_utf(reader)?;
        let start = read_i64(reader)?;
        let end = read_i64(reader)?;
        let name = read_utf(reader)?;
        let id = read_utf(reader)?;
        let strand = read_utf(reader)?;
        let biotype = read_optional_utf(reader)?;
        let description = read_optional_utf(reader)?;

        let tx_count = read_u32(reader)? as usize;
        let mut transcripts = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            transcripts.push(read_transcript(reader)?);
        }

        let exon_count = read_u32(reader)? as usize;
        let mut exons = Vec::with_capacity(exon_count);
        for _ in 0..exon_count {
            exons.push(read_exon(reader)?);
        }

        genes.push(Gene {
            chrom,
            start,
            end,
            name,
            id,
            strand,
            biotype,
            description,
            transcripts,
            exons,
        });
    }

    Ok(GeneCache { version, genes })
}

fn read_transcript<R: Read>(reader: &mut R) -> Result<Transcript> {
    let id = read_utf(reader)?;
    let name = read_utf(reader)?;
    let start = read_i64(reader)?;
    let end = read_i64(reader)?;
    let biotype = read_utf(reader)?;
    let mane_select = read_bool(reader)?;
    let mane_clinical = read_bool(reader)?;
    let cds_start = read_i64(reader)?;
    let cds_end = read_i64(reader)?;

    let exon_count = read_u32(reader)? as usize;
    let mut exons = Vec::with_capacity(exon_count);
    for _ in 0..exon_count {
        exons.push(read_exon(reader)?);
    }

    Ok(Transcript {
        id,
        name,
        start,
        end,
        biotype,
        mane_select,
        mane_clinical,
        cds_start,
        cds_end,
        exons,
    })
}

fn read_exon<R: Read>(reader: &mut R) -> Result<Exon> {
    let start = read_i64(reader)?;
    let end = read_i64(reader)?;
    Ok(Exon { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> GeneCache {
        GeneCache {
            version: 1,
            genes: vec![Gene {
                chrom: "chr17".to_string(),
                start: 43_044_295,
                end: 43_125_483,
                name: "BRCA1".to_string(),
                id: "ENSG00000012048".to_string(),
                strand: "-".to_string(),
                biotype: Some("protein_coding".to_string()),
                description: None,
                transcripts: vec![Transcript {
                    id: "ENST00000357654".to_string(),
                    name: "BRCA1-201".to_string(),
                    start: 43_044_295,
                    end: 43_125_483,
                    biotype: "protein_coding".to_string(),
                    mane_select: true,
                    mane_clinical: false,
                    cds_start: 43_045_677,
                    cds_end: 43_124_115,
                    exons: vec![Exon { start: 43_044_295, end: 43_045_802 }, Exon { start: 43_047_643, end: 43_047_703 }],
                }],
                exons: vec![Exon { start: 43_044_295, end: 43_045_802 }],
            }],
        }
    }

    #[test]
    fn test_property_12_round_trip_is_identity() {
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
        buf[0] = b'X';
        let err = decode(&mut &buf[..], 1).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut buf = Vec::new();
        encode(&mut buf, &sample_cache()).unwrap();
        let err = decode(&mut &buf[..], 2).unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));
    }
}
