//! The `COSM` on-disk cache: COSMIC mutation entries.
//!
//! The spec names the payload only as "15 UTF fields and 3 booleans in the
//! order defined by the CSV schema" without naming that schema; the field
//! order below follows COSMIC's own mutation-export column order (gene
//! through fathmm prediction, flagged last) and is recorded as a decision
//! in the repository's design notes.

use std::io::{Read, Write};

use gview_core::error::{Error, Result};

use crate::io::{read_bool, read_u32, read_utf, write_bool, write_u32, write_utf};

/// `b"COSM"`, equal to `0x434F534D` read as a big-endian `u32`.
pub const MAGIC: [u8; 4] = *b"COSM";

/// One COSMIC mutation entry: 15 string fields and 3 boolean flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CosmicEntry {
    /// Gene symbol.
    pub gene_name: String,
    /// COSMIC mutation id, e.g. `"COSM6924"`.
    pub mutation_id: String,
    /// Accession number of the source transcript.
    pub accession_number: String,
    /// CDS-level mutation description, e.g. `"c.35G>A"`.
    pub mutation_cds: String,
    /// Protein-level mutation description, e.g. `"p.G12D"`.
    pub mutation_aa: String,
    /// Mutation description (substitution, deletion, ...).
    pub mutation_description: String,
    /// Reference genome build.
    pub genome_build: String,
    /// Reference sequence name.
    pub chrom: String,
    /// 1-based start of the mutation span.
    pub start: String,
    /// 1-based end of the mutation span.
    pub end: String,
    /// Mutation strand, `"+"` or `"-"`.
    pub strand: String,
    /// Primary tissue site of observation.
    pub primary_site: String,
    /// Primary histology of observation.
    pub primary_histology: String,
    /// FATHMM pathogenicity prediction.
    pub fathmm_prediction: String,
    /// Mutation zygosity, if known.
    pub mutation_zygosity: String,
    /// Whether this mutation is flagged as a known SNP.
    pub is_snp: bool,
    /// Whether this is resolved at genome-wide screen resolution.
    pub is_genome_wide_screen: bool,
    /// Whether curators flagged this entry for review.
    pub is_flagged: bool,
}

/// A parsed COSMIC cache.
#[derive(Clone, Debug, PartialEq)]
pub struct CosmicCache {
    /// Format version this cache was written with.
    pub version: u32,
    /// Entries, in file order.
    pub entries: Vec<CosmicEntry>,
}

/// Encodes `cache` in the `COSM` binary layout.
pub fn encode<W: Write>(writer: &mut W, cache: &CosmicCache) -> std::io::Result<()> {
    writer.write_all(&MAGIC)?;
    write_u32(writer, cache.version)?;
    write_u32(writer, cache.entries.len() as u32)?;

    for entry in &cache.entries {
        write_utf(writer, &entry.gene_name)?;
        write_utf(writer, &entry.mutation_id)?;
        write_utf(writer, &entry.accession_number)?;
        write_utf(writer, &entry.mutation_cds)?;
        write_utf(writer, &entry.mutation_aa)?;
        write_utf(writer, &entry.mutation_description)?;
        write_utf(writer, &entry.genome_build)?;
        write_utf(writer, &entry.chrom)?;
        write_utf(writer, &entry.start)?;
        write_utf(writer, &entry.end)?;
        write_utf(writer, &entry.strand)?;
        write_utf(writer, &entry.primary_site)?;
        write_utf(writer, &entry.primary_histology)?;
        write_utf(writer, &entry.fathmm_prediction)?;
        write_utf(writer, &entry.mutation_zygosity)?;
        write_bool(writer, entry.is_snp)?;
        write_bool(writer, entry.is_genome_wide_screen)?;
        write_bool(writer, entry.is_flagged)?;
    }

    Ok(())
}

/// Decodes a `COSM` cache, rejecting wrong magic or a version other than
/// `expected_version`.
pub fn decode<R: Read>(reader: &mut R, expected_version: u32) -> Result<CosmicCache> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|_| Error::UnexpectedEof)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic { context: "COSMIC annotation cache" });
    }

    let version = read_u32(reader)?;
    if version != expected_version {
        return Err(Error::CacheCorrupt {
            reason: format!("cosmic cache version {version} does not match expected {expected_version}"),
        });
    }

    let count = read_u32(reader)? as usize;
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {
        entries.push(CosmicEntry {
            gene_name: read_utf(reader)?,
            mutation_id: read_utf(reader)?,
            accession_number: read_utf(reader)?,
            mutation_cds: read_utf(reader)?,
            mutation_aa: read_utf(reader)?,
            mutation_description: read_utf(reader)?,
            genome_build: read_utf(reader)?,
            chrom: read_utf(reader)?,
            start: read_utf(reader)?,
            end: read_utf(reader)?,
            strand: read_utf(reader)?,
            primary_site: read_utf(reader)?,
            primary_histology: read_utf(reader)?,
            fathmm_prediction: read_utf(reader)?,
            mutation_zygosity: read_utf(reader)?,
            is_snp: read_bool(reader)?,
            is_genome_wide_screen: read_bool(reader)?,
            is_flagged: read_bool(reader)?,
        });
    }

    Ok(CosmicCache { version, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cache() -> CosmicCache {
        CosmicCache {
            version: 1,
            entries: vec![CosmicEntry {
                gene_name: "KRAS".to_string(),
                mutation_id: "COSM521".to_string(),
                accession_number: "ENST00000256078".to_string(),
                mutation_cds: "c.35G>A".to_string(),
                mutation_aa: "p.G12D".to_string(),
                mutation_description: "Substitution - Missense".to_string(),
                genome_build: "GRCh38".to_string(),
                chrom: "chr12".to_string(),
                start: "25245350".to_string(),
                end: "25245350".to_string(),
                strand: "-".to_string(),
                primary_site: "pancreas".to_string(),
                primary_histology: "carcinoma".to_string(),
                fathmm_prediction: "PATHOGENIC".to_string(),
                mutation_zygosity: "het".to_string(),
                is_snp: false,
                is_genome_wide_screen: true,
                is_flagged: false,
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
        buf[3] = b'!';
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
