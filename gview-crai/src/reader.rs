//! Parsing the gzip-wrapped TSV CRAI format.

use std::io::Read;

use flate2::read::MultiGzDecoder;
use gview_core::error::{Error, Result};

use crate::record::Record;

/// Reads and parses a CRAI index from a gzip-compressed TSV stream.
pub fn read_index<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut decoder = MultiGzDecoder::new(reader);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| Error::DecompressionFailure {
            reason: e.to_string(),
        })?;

    parse_tsv(&text)
}

fn parse_tsv(text: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');

        let mut next_i64 = || -> Result<i64> {
            fields
                .next()
                .ok_or(Error::UnexpectedEof)?
                .parse()
                .map_err(|_| Error::CacheCorrupt {
                    reason: "malformed CRAI field".into(),
                })
        };

        let seq_id = next_i64()? as i32;
        let alignment_start = next_i64()?;
        let alignment_span = next_i64()?;
        let container_offset = next_i64()? as u64;
        let slice_offset = next_i64()? as u64;
        let slice_size = next_i64()? as u64;

        records.push(Record {
            seq_id,
            alignment_start,
            alignment_span,
            container_offset,
            slice_offset,
            slice_size,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_read_index() {
        let text = "0\t1\t100\t0\t0\t500\n0\t101\t50\t500\t0\t200\n";
        let bytes = gzip(text);
        let records = read_index(&bytes[..]).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq_id, 0);
        assert_eq!(records[0].alignment_start, 1);
        assert_eq!(records[0].alignment_span, 100);
        assert_eq!(records[0].container_offset, 0);
        assert_eq!(records[1].container_offset, 500);
    }

    #[test]
    fn test_parse_tsv_skips_blank_lines() {
        let records = parse_tsv("0\t1\t10\t0\t0\t20\n\n").unwrap();
        assert_eq!(records.len(), 1);
    }
}
